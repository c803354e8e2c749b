use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tokio_serial::SerialPortType;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gaswatch::events;
use gaswatch::session::{FileTransport, SerialTransport, TcpTransport, Transport};
use gaswatch::ui::{self, theme::terminal_is_dark};
use gaswatch::{App, DeviceSession, SettingsStore, Threshold, DEFAULT_BAUD_RATE};

/// How long to wait for terminal input before redrawing.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "gaswatch")]
#[command(about = "Terminal dashboard for three-sensor MQ gas boards over UART")]
struct Args {
    /// Serial port to open (auto-selects a USB adapter when omitted)
    #[arg(short, long, conflicts_with_all = ["connect", "replay"])]
    port: Option<String>,

    /// Connect to a serial-over-TCP bridge instead (host:port)
    #[arg(short, long, conflicts_with_all = ["port", "replay"])]
    connect: Option<String>,

    /// Replay a captured UART log file as the device
    #[arg(short, long, conflicts_with_all = ["port", "connect"])]
    replay: Option<PathBuf>,

    /// Serial baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Alert threshold in ppm (stored for later runs)
    #[arg(short, long, allow_negative_numbers = true)]
    threshold: Option<i64>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write logs to this file (RUST_LOG controls the filter)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(ref path) = args.log_file {
        init_tracing(path)?;
    }

    if args.list_ports {
        list_ports();
        return Ok(());
    }

    let store = match args.settings {
        Some(ref path) => SettingsStore::new(path),
        None => SettingsStore::at_default_location(),
    };
    let first_run = !store.path().exists();
    let mut settings = store.load_or_default();
    if first_run {
        settings.dark_mode = terminal_is_dark();
    }
    if let Some(ppm) = args.threshold {
        settings.threshold = Threshold::new(ppm);
    }
    if first_run || args.threshold.is_some() {
        if let Err(e) = store.save(&settings) {
            tracing::warn!("{}", e);
        }
    }

    let transport = select_transport(&args);
    tracing::info!(
        "gaswatch {} starting on {}",
        env!("CARGO_PKG_VERSION"),
        transport.description()
    );

    // The read task runs on the runtime's workers while the UI loop owns
    // the main thread
    let rt = Runtime::new()?;
    let (session, session_events) = DeviceSession::new(transport, args.baud);
    let mut app = App::new(session, session_events, store, settings);
    app.request_connect();

    let result = run_tui(&rt, &mut app);

    rt.block_on(app.disconnect());
    result
}

/// Install a file-backed tracing subscriber
fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gaswatch=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();
    Ok(())
}

/// Build the transport named by the command line
fn select_transport(args: &Args) -> Box<dyn Transport> {
    if let Some(ref addr) = args.connect {
        Box::new(TcpTransport::new(addr.as_str()))
    } else if let Some(ref path) = args.replay {
        Box::new(FileTransport::new(path))
    } else {
        Box::new(SerialTransport::new(args.port.clone()))
    }
}

/// Print available serial ports
fn list_ports() {
    let ports = SerialTransport::available_ports();
    if ports.is_empty() {
        println!("No serial ports found");
        return;
    }
    for port in ports {
        let kind = match port.port_type {
            SerialPortType::UsbPort(usb) => format!(
                "USB {:04x}:{:04x} {}",
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            other => format!("{:?}", other),
        };
        println!("{}\t{}", port.port_name, kind.trim_end());
    }
}

/// Run the TUI until the user quits
fn run_tui(rt: &Runtime, app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, rt, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rt: &Runtime,
    app: &mut App,
) -> Result<()> {
    while app.running {
        app.drain_session_events();

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Connect and send block the loop, so they run after a frame
        // showing the pending state has been drawn
        if app.has_pending_work() {
            rt.block_on(app.run_pending());
            continue;
        }

        if let Some(event) = events::poll_event(TICK)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}
