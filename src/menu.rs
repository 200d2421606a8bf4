// Numbered interactive menu

use std::io::{self, BufRead, Write};

/// One menu entry; the discriminant order is the option number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Exit,
    InstallAll,
    UninstallAll,
    ConfigureDns,
    CheckConnection,
    CheckAptLock,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::Exit,
        MenuAction::InstallAll,
        MenuAction::UninstallAll,
        MenuAction::ConfigureDns,
        MenuAction::CheckConnection,
        MenuAction::CheckAptLock,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Exit => "Exit",
            MenuAction::InstallAll => "Install all",
            MenuAction::UninstallAll => "Uninstall all",
            MenuAction::ConfigureDns => "Configure DNS",
            MenuAction::CheckConnection => "Check Connection",
            MenuAction::CheckAptLock => "Check apt lock",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

pub fn render_menu<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output, "\n\n==========   Menu   ==========")?;
    for (index, action) in MenuAction::ALL.iter().enumerate() {
        writeln!(output, " {} - {}", index, action.label())?;
    }
    Ok(())
}

/// Show the menu and read a choice. Invalid entries re-prompt; end of input
/// is treated as Exit.
pub fn prompt<B: BufRead, W: Write>(input: &mut B, output: &mut W) -> io::Result<MenuAction> {
    render_menu(output)?;

    loop {
        write!(output, "Enter the option: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(MenuAction::Exit);
        }

        let choice = line.trim();
        match choice.parse().ok().and_then(MenuAction::from_index) {
            Some(action) => return Ok(action),
            None => writeln!(
                output,
                "Invalid option '{}': enter a number from 0 to {}",
                choice,
                MenuAction::ALL.len() - 1
            )?,
        }
    }
}
