#[cfg(test)]
mod tests {
    use crate::app::*;
    use crate::config::Settings;
    use crate::error::Result;
    use crate::network::DnsOutcome;
    use crate::shell::testing::FakeShell;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    const LOOPBACK: &str = "\
64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=0.031 ms

--- 127.0.0.1 ping statistics ---
5 packets transmitted, 5 received, 0% packet loss, time 4093ms
";

    const UNREACHABLE: &str = "\
--- 10.255.255.1 ping statistics ---
5 packets transmitted, 0 received, 100% packet loss, time 4098ms
";

    fn settings(dir: &Path) -> Settings {
        let unit_dir = dir.join("systemd");
        std::fs::create_dir_all(&unit_dir).unwrap();

        Settings {
            dns_servers: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
            resolv_conf: dir.join("resolv.conf"),
            last_sync_file: dir.join("last_sync_file.log"),
            unit_dir,
            staging_dir: dir.join("staging"),
            lock_files: vec![dir.join("lock")],
            exec_path: Some(PathBuf::from("/usr/local/bin/hostprov")),
            ..Settings::default()
        }
    }

    async fn run_action(app: &App<FakeShell>, action: crate::menu::MenuAction) -> String {
        let mut out = Vec::new();
        app.handle(action, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_app_creation() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let app = App::new(settings(dir.path()), FakeShell::new())?;

        let names: Vec<&str> = app.install_order().map(|r| r.name()).collect();
        assert_eq!(names, vec!["system-date-sync.service", "system-date-sync.timer"]);
        let names: Vec<&str> = app.uninstall_order().map(|r| r.name()).collect();
        assert_eq!(names, vec!["system-date-sync.timer", "system-date-sync.service"]);

        let rendered = app.render_units();
        assert!(rendered.contains("# system-date-sync.service\n[Unit]\n"));
        assert!(rendered.contains("ExecStart=/usr/local/bin/hostprov date-sync\n"));
        assert!(rendered.contains("Unit=system-date-sync.service\n"));
        Ok(())
    }

    #[test]
    fn test_date_sync_command_carries_config() {
        let mut settings = Settings {
            exec_path: Some(PathBuf::from("/opt/host prov/hostprov")),
            ..Settings::default()
        };
        settings.source_path = Some(PathBuf::from("/etc/hostprov/settings.yaml"));

        assert_eq!(
            date_sync_command(&settings).unwrap(),
            "\"/opt/host prov/hostprov\" --config /etc/hostprov/settings.yaml date-sync"
        );
    }

    #[test]
    fn test_date_sync_command_escapes_systemd_syntax() {
        let mut settings = Settings {
            exec_path: Some(PathBuf::from("/opt/100%/hostprov")),
            ..Settings::default()
        };
        settings.source_path = Some(PathBuf::from("/srv/my \"lab\"\\$HOME/settings.yaml"));

        assert_eq!(
            date_sync_command(&settings).unwrap(),
            "/opt/100%%/hostprov --config \"/srv/my \\\"lab\\\"\\\\$$HOME/settings.yaml\" date-sync"
        );
    }

    #[tokio::test]
    async fn test_install_then_uninstall_all() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = FakeShell::new();
        let app = App::new(settings(dir.path()), shell.clone())?;

        let results = app.install_all().await;
        assert_eq!(
            results,
            vec![
                ("system-date-sync.service".to_string(), true),
                ("system-date-sync.timer".to_string(), true),
            ]
        );
        assert_eq!(
            shell.calls_to("systemctl"),
            vec![
                "systemctl daemon-reload",
                "systemctl daemon-reload",
                "systemctl enable system-date-sync.timer",
                "systemctl start system-date-sync.timer",
            ]
        );
        let timer = dir.path().join("systemd").join("system-date-sync.timer");
        assert!(timer.exists());

        let removed = app.uninstall_all().await;
        assert_eq!(removed, vec!["system-date-sync.timer", "system-date-sync.service"]);
        assert!(!timer.exists());
        assert!(app.uninstall_all().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reinstall_removes_previous_units_first() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = FakeShell::new();
        let app = App::new(settings(dir.path()), shell.clone())?;

        app.install_all().await;
        let before = shell.calls().len();
        app.install_all().await;

        let second_run = &shell.calls()[before..];
        assert_eq!(second_run[0], "systemctl stop system-date-sync.timer");
        assert_eq!(second_run[1], "systemctl disable system-date-sync.timer");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_copy_is_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = FakeShell::new();
        shell.fail_on("cp ");
        let app = App::new(settings(dir.path()), shell)?;

        let text = run_action(&app, crate::menu::MenuAction::InstallAll).await;
        assert!(text.contains("[RESULT] Installed system-date-sync.service: No"));
        assert!(text.contains("[RESULT] Installed system-date-sync.timer: No"));
        Ok(())
    }

    #[tokio::test]
    async fn test_configure_dns_reports() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let app = App::new(settings(dir.path()), FakeShell::new())?;

        let first = run_action(&app, crate::menu::MenuAction::ConfigureDns).await;
        assert!(first.contains("[RESULT] Configuration completed: Yes"));

        let second = run_action(&app, crate::menu::MenuAction::ConfigureDns).await;
        assert!(second.contains("[INFO] Configuration already applied."));
        assert_eq!(app.configure_dns().await, DnsOutcome::Unchanged);
        Ok(())
    }

    #[tokio::test]
    async fn test_check_connection_pings_every_host() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = FakeShell::new();
        shell.respond("ip route", "default via 10.0.2.2 dev eth0\n");
        shell.respond("ping ", LOOPBACK);
        let app = App::new(settings(dir.path()), shell.clone())?;

        let text = run_action(&app, crate::menu::MenuAction::CheckConnection).await;
        assert!(text.contains("[SUCCESS] Successfully connected to DNS servers."));
        assert!(text.contains("[INFO] Full test 100.0% rate of success"));

        let pinged: Vec<String> = shell
            .calls_to("ping")
            .iter()
            .filter_map(|call| call.split_whitespace().last().map(str::to_string))
            .collect();
        assert_eq!(pinged, vec!["www.google.com", "8.8.8.8", "1.1.1.1"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_check_connection_reports_failure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = FakeShell::new();
        shell.respond_with("ping ", false, UNREACHABLE);
        let app = App::new(settings(dir.path()), shell)?;

        let text = run_action(&app, crate::menu::MenuAction::CheckConnection).await;
        assert!(text.contains("[ERROR] Failed to connect to DNS servers."));
        assert!(text.contains("[INFO] Full test 0.0% rate of success\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_locks_reports() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = FakeShell::new();
        shell.respond("ps aux", "");
        let app = App::new(settings(dir.path()), shell)?;

        let text = run_action(&app, crate::menu::MenuAction::CheckAptLock).await;
        assert!(text.contains("[SUCCESS] apt locks cleared (0 processes killed)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_loop() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let resolv = dir.path().join("resolv.conf");
        let app = App::new(settings(dir.path()), FakeShell::new())?;

        let mut input = Cursor::new("7\n3\n0\n2\n");
        let mut out = Vec::new();
        app.run_menu(&mut input, &mut out).await?;

        let text = String::from_utf8(out)?;
        assert!(text.contains("Invalid option '7'"));
        assert!(text.contains("[RESULT] Configuration completed: Yes"));
        assert!(text.ends_with("Log out of the system...\n"));
        assert!(!text.contains("### Uninstalling ###"));
        assert_eq!(
            std::fs::read_to_string(resolv)?,
            "nameserver 8.8.8.8\nnameserver 1.1.1.1\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_loop_ends_at_end_of_input() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let app = App::new(settings(dir.path()), FakeShell::new())?;

        let mut out = Vec::new();
        app.run_menu(&mut Cursor::new(""), &mut out).await?;
        assert!(String::from_utf8(out)?.contains("Log out of the system..."));
        Ok(())
    }
}
