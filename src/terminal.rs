//! Toy shell shown on the desktop computer.

use rand::seq::SliceRandom;
use rand::RngCore;

pub const BANNER: [&str; 3] = ["OS v1.0 - Welcome!", HELP_HINT, ""];
pub const HELP_HINT: &str = "Type \"help\" for available commands.";
pub const PROMPT: &str = "$ ";

const HELP: [&str; 8] = [
    "Available commands:",
    "  help  - Show this help",
    "  hello - Say hello",
    "  cat   - Show ASCII cat",
    "  time  - Show current time",
    "  clear - Clear screen",
    "  joke  - Tell a joke",
    "  exit  - Exit computer",
];

const CAT: [&str; 5] = [
    "  /\\_/\\  ",
    " ( o.o ) ",
    "  > ^ <  ",
    " /|   |\\",
    "(_|   |_)",
];

pub const JOKES: [&str; 4] = [
    "Why do programmers prefer dark mode? Because light attracts bugs!",
    "A cat walked into a bar... and got stuck on the keyboard. asdfghjkl;",
    "Why did the lamp break up with the sofa? It needed more space!",
    "What do you call a cat that sits on a computer? A lap-top!",
];

/// Wall clock used by the `time` command.
pub trait Clock {
    /// Current time of day, formatted for display.
    fn local_time(&self) -> String;
}

/// UTC wall clock.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn local_time(&self) -> String {
        let seconds = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let of_day = seconds % 86_400;
        format!(
            "{:02}:{:02}:{:02} UTC",
            of_day / 3600,
            of_day / 60 % 60,
            of_day % 60
        )
    }
}

/// Browser clock using the user's locale.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn local_time(&self) -> String {
        js_sys::Date::new_0()
            .to_locale_time_string("default")
            .into()
    }
}

/// Clock that always reports the same time.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn local_time(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalState {
    #[default]
    Closed,
    Open,
}

/// What the caller has to do after a line was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    Continue,
    /// The user asked to leave the computer.
    Exit,
}

#[derive(Debug, Clone, Default)]
pub struct Terminal {
    state: TerminalState,
    transcript: Vec<String>,
    revision: u64,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TerminalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == TerminalState::Open
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Bumped on every transcript change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Wipes the transcript and prints the banner.
    pub fn open(&mut self) {
        self.state = TerminalState::Open;
        self.transcript.clear();
        self.transcript.extend(BANNER.iter().map(|line| line.to_string()));
        self.revision += 1;
    }

    pub fn close(&mut self) {
        self.state = TerminalState::Closed;
    }

    pub fn submit(
        &mut self,
        line: &str,
        clock: &dyn Clock,
        rng: &mut dyn RngCore,
    ) -> TerminalOutcome {
        if !self.is_open() {
            return TerminalOutcome::Continue;
        }
        let command = line.trim().to_lowercase();
        self.push(format!("{PROMPT}{command}"));

        let mut outcome = TerminalOutcome::Continue;
        match command.as_str() {
            "help" => self.extend(&HELP),
            "hello" => self.push("Hello, cozy human! 🏠".to_string()),
            "cat" => self.extend(&CAT),
            "time" => self.push(format!("Current time: {}", clock.local_time())),
            "clear" => {
                self.transcript.clear();
                self.revision += 1;
                return TerminalOutcome::Continue;
            }
            "joke" => {
                let joke = JOKES.choose(rng).copied().unwrap_or(JOKES[0]);
                self.push(joke.to_string());
            }
            "exit" => outcome = TerminalOutcome::Exit,
            "" => {}
            other => {
                self.push(format!("Unknown command: {other}"));
                self.push(HELP_HINT.to_string());
            }
        }
        self.push(String::new());
        outcome
    }

    fn push(&mut self, line: String) {
        self.transcript.push(line);
        self.revision += 1;
    }

    fn extend(&mut self, lines: &[&str]) {
        for line in lines {
            self.push(line.to_string());
        }
    }
}
