#[cfg(not(target_arch = "wasm32"))]
mod desktop;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::fs;
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use cozy_room::app::{scene_summary, state_summary, TranscriptEcho};
    use cozy_room::terminal::SystemClock;
    use cozy_room::{Room, RoomConfig, Scene, Terminal, TerminalOutcome};

    use crate::desktop::{self, WindowInitError};

    /// Walk around a cozy room and poke at things.
    #[derive(Debug, Parser)]
    #[command(name = "cozy-room", version)]
    struct Cli {
        /// Room layout XML to load instead of the built-in room.
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Seed for cat phrases, jokes and flicker.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the room and exit without opening a window.
        #[arg(long)]
        summary_only: bool,
        /// Run the computer's terminal on stdin and stdout.
        #[arg(long, conflicts_with = "summary_only")]
        terminal: bool,
        /// Do not open the external link when the computer is used.
        #[arg(long)]
        no_link: bool,
        /// Vertical field of view in degrees.
        #[arg(long)]
        fov: Option<f32>,
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        if cli.terminal {
            return run_terminal(cli.seed);
        }

        let mut scene = match &cli.scene {
            Some(path) => {
                let xml = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Scene::from_xml(&xml).context("failed to parse scene XML")?
            }
            None => Scene::cozy_room().context("failed to parse built-in room")?,
        };
        if let Some(fov) = cli.fov {
            scene.camera.fov = fov.clamp(10.0, 150.0);
        }

        for line in scene_summary(&scene) {
            println!("{line}");
        }

        let mut config = RoomConfig::default();
        if cli.no_link {
            config.computer_link = None;
        }
        let room = build_room(scene, config, cli.seed);

        if cli.summary_only {
            return print_state(&room);
        }

        let fallback = build_room(room.scene().clone(), room.config().clone(), cli.seed);
        match desktop::run(room) {
            Ok(room) => print_state(&room),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode \
                         (set DISPLAY or install X11 libs to enable rendering)."
                    );
                    print_state(&fallback)
                } else {
                    Err(err)
                }
            }
        }
    }

    fn build_room(scene: Scene, config: RoomConfig, seed: Option<u64>) -> Room {
        let room = Room::new(scene, config);
        match seed {
            Some(seed) => room.with_seed(seed),
            None => room,
        }
    }

    fn print_state(room: &Room) -> Result<()> {
        for line in state_summary(room) {
            println!("{line}");
        }
        Ok(())
    }

    fn run_terminal(seed: Option<u64>) -> Result<()> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let clock = SystemClock;
        let mut terminal = Terminal::new();
        let mut echo = TranscriptEcho::new();
        terminal.open();

        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in echo.pending(terminal.transcript()) {
            writeln!(out, "{line}")?;
        }

        for line in io::stdin().lock().lines() {
            let line = line.context("failed to read stdin")?;
            let outcome = terminal.submit(&line, &clock, &mut rng);
            for line in echo.pending(terminal.transcript()) {
                writeln!(out, "{line}")?;
            }
            out.flush()?;
            if outcome == TerminalOutcome::Exit {
                break;
            }
        }
        terminal.close();
        Ok(())
    }
}
