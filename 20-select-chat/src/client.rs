use std::io;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::{net::TcpStream, select};
use tracing::{info, warn};

use crate::{
    cli::ClientArgs,
    reader::{ReadResult, Scratch},
    resolve::{connect_first, resolve},
    session::{Action, Input, Session},
    socket::send_all,
    ui,
};

/// Connects to the server and runs the chat screen until the user quits.
pub async fn run(args: ClientArgs) -> Result<()> {
    let stream = establish_connection(&args).await?;
    let server = stream
        .peer_addr()
        .context("failed to read the server address")?;

    let (_, rows) = crossterm::terminal::size().context("failed to query terminal size")?;
    let mut session = Session::new(rows);
    session.announce(format!("Connected to {}", server.ip()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_client_loop(&mut terminal, &stream, &mut session).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if result.is_ok() {
        info!("leaving chat");
    }
    result
}

async fn establish_connection(args: &ClientArgs) -> Result<TcpStream> {
    let candidates = resolve(Some(&args.host), &args.port).await?;
    let stream = connect_first(&candidates)
        .await
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    info!(server = ?stream.peer_addr().ok(), "connected");
    Ok(stream)
}

enum Wake {
    Socket,
    Terminal(Option<io::Result<Event>>),
}

async fn run_client_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    stream: &TcpStream,
    session: &mut Session,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut scratch = Scratch::new();

    loop {
        terminal.draw(|frame| ui::render(frame, session))?;

        let wake = select! {
            ready = stream.readable() => {
                ready.context("failed to wait for the server connection")?;
                Wake::Socket
            }
            event = events.next() => Wake::Terminal(event),
        };

        match wake {
            Wake::Socket => handle_server_message(scratch.read_from(stream), session)?,
            Wake::Terminal(None) => bail!("terminal input closed"),
            Wake::Terminal(Some(event)) => {
                let event = event.context("failed to read terminal input")?;
                if !handle_terminal_event(&event, stream, session).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_server_message(result: Option<ReadResult>, session: &mut Session) -> Result<()> {
    match result {
        None => Ok(()),
        Some(ReadResult::Data(payload)) => {
            session.receive(&payload);
            Ok(())
        }
        Some(ReadResult::PeerClosed) => bail!("server closed the connection"),
        Some(ReadResult::Error(err)) => {
            Err(err).context("failed to read from the server connection")
        }
    }
}

/// Applies one terminal event. Returns `false` once the session should end.
async fn handle_terminal_event(event: &Event, stream: &TcpStream, session: &mut Session) -> bool {
    match session.apply(Input::from(event)) {
        Action::Continue => true,
        Action::Quit => false,
        Action::Send(text) => {
            if let Err(error) = send_all(stream, text.as_bytes()).await {
                warn!(?error, "failed to send message");
                session.send_failed();
            }
            true
        }
    }
}
