use crossbeam::channel::{bounded, Receiver, Sender};
use std::io::BufRead;
use std::thread;

/// Commands accepted on the interactive control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Keep running (acknowledgement, no effect).
    Continue,
    /// Stop sampling and unwind every loop, like a termination signal.
    Quit,
}

/// Map one console line to a command. Unrecognized input is ignored.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "n" => Some(Command::Continue),
        "q" => Some(Command::Quit),
        _ => None,
    }
}

/// Spawn the stdin listener and hand back the receiving end for the reader.
///
/// Reading the console must never happen inside the reader loop itself (it
/// would stall sampling), so the blocking reads live on their own thread and
/// the reader drains the channel without blocking once per tick. The listener
/// thread is deliberately not joined at shutdown: it may be parked in a
/// blocking stdin read, and process exit reclaims it.
pub fn spawn_stdin_listener() -> Receiver<Command> {
    let (tx, rx) = bounded(4);
    thread::spawn(move || listen(std::io::stdin().lock(), tx));
    rx
}

fn listen(input: impl BufRead, tx: Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        match parse_command(&line) {
            // A full channel means the reader is behind; dropping excess
            // acknowledgements is fine.
            Some(command @ Command::Continue) => {
                let _ = tx.try_send(command);
            }
            // Quit must never be lost: wait for the reader to drain a slot.
            // Errors only if the reader is gone, in which case we are done.
            Some(command @ Command::Quit) => {
                let _ = tx.send(command);
                break;
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_continue_and_quit() {
        assert_eq!(parse_command("n"), Some(Command::Continue));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command(" q \n"), Some(Command::Quit));
    }

    #[test]
    fn ignores_unrecognized_input() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("quit"), None);
        assert_eq!(parse_command("x"), None);
    }

    #[test]
    fn quit_is_delivered_even_when_the_channel_is_full() {
        let (tx, rx) = bounded(4);
        // More acknowledgements than the channel holds, then a quit.
        let listener =
            thread::spawn(move || listen("n\nn\nn\nn\nn\nq\n".as_bytes(), tx));

        // Drain the way the reader does, and expect the quit to arrive
        // once a slot frees up.
        let mut saw_quit = false;
        while let Ok(command) = rx.recv_timeout(std::time::Duration::from_secs(2)) {
            if command == Command::Quit {
                saw_quit = true;
            }
        }
        assert!(saw_quit);
        listener.join().unwrap();
    }

    #[test]
    fn listener_forwards_commands_and_stops_at_quit() {
        let (tx, rx) = bounded(4);
        listen("n\njunk\nq\nn\n".as_bytes(), tx);
        assert_eq!(rx.try_recv(), Ok(Command::Continue));
        assert_eq!(rx.try_recv(), Ok(Command::Quit));
        // Nothing after quit.
        assert!(rx.try_recv().is_err());
    }
}
