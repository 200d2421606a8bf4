// Ping output parsing
//
// `ping` output is not a stable interface: this only understands the English
// iputils/BSD summary and the Windows summary. Any other locale parses as
// "nothing transmitted, nothing received".

/// Counts recovered from one ping run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingSummary {
    pub transmitted: Option<u32>,
    pub received: u32,
}

impl PingSummary {
    /// Received / transmitted in percent. `attempts` stands in for the
    /// transmitted count when the summary line was missing.
    pub fn success_rate(&self, attempts: u32) -> f64 {
        let transmitted = self.transmitted.filter(|&n| n > 0).unwrap_or(attempts);
        if transmitted == 0 {
            return 0.0;
        }
        let received = self.received.min(transmitted);
        f64::from(received) / f64::from(transmitted) * 100.0
    }
}

pub fn parse_ping_output(output: &str) -> PingSummary {
    let mut replies = 0;
    let mut transmitted = None;
    let mut received = None;

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if is_reply(line) {
            replies += 1;
        } else if line.contains("packets transmitted") {
            let (sent, got) = parse_posix_summary(line);
            transmitted = sent.or(transmitted);
            received = got.or(received);
        } else if line.contains("Packets: Sent") {
            let (sent, got) = parse_windows_summary(line);
            transmitted = sent.or(transmitted);
            received = got.or(received);
        }
    }

    PingSummary {
        transmitted,
        received: received.unwrap_or(replies),
    }
}

fn is_reply(line: &str) -> bool {
    line.contains("bytes from") || (line.starts_with("Reply from") && line.contains("TTL="))
}

// "5 packets transmitted, 4 received, 20% packet loss, time 4006ms"
// "5 packets transmitted, 4 packets received, 20.0% packet loss"
fn parse_posix_summary(line: &str) -> (Option<u32>, Option<u32>) {
    let mut transmitted = None;
    let mut received = None;
    for part in line.split(',').map(str::trim) {
        let count = part.split_whitespace().next().and_then(|n| n.parse().ok());
        if part.contains("transmitted") {
            transmitted = count;
        } else if part.contains("received") {
            received = count;
        }
    }
    (transmitted, received)
}

// "Packets: Sent = 4, Received = 4, Lost = 0 (0% loss),"
fn parse_windows_summary(line: &str) -> (Option<u32>, Option<u32>) {
    let mut transmitted = None;
    let mut received = None;
    for part in line.split(',').map(str::trim) {
        let count = part
            .split('=')
            .nth(1)
            .and_then(|value| value.split_whitespace().next())
            .and_then(|n| n.parse().ok());
        if part.contains("Sent") {
            transmitted = count;
        } else if part.starts_with("Received") {
            received = count;
        }
    }
    (transmitted, received)
}
