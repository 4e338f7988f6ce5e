//! Entry point for `ir-msgcom`.
//!
//! Parses CLI arguments and dispatches into **send**, **receive** or
//! **loopback** mode.  All protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, argument parsing, threads).

use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};

use ir_msgcom::simulator::{FaultConfig, LoopbackLink};
use ir_msgcom::socket::UdpTransport;
use ir_msgcom::{Connection, Message, ProtocolConfig, TaskId};

/// Reliable word exchange over a bit-width-tagged infrared link.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    timing: Timing,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send one message to a peer over UDP.
    Send {
        /// Local address to bind (e.g. 127.0.0.1:9001).
        #[arg(short, long, default_value = "127.0.0.1:9001")]
        bind: SocketAddr,
        /// Address of the receiving peer.
        #[arg(short, long, default_value = "127.0.0.1:9000")]
        peer: SocketAddr,
        /// Task identifier (1..=0xfff, decimal or 0x-prefixed hex).
        #[arg(short, long, value_parser = parse_task)]
        task: TaskId,
        /// Data words (decimal or 0x-prefixed hex).
        #[arg(required = true, value_parser = parse_u32)]
        words: Vec<u32>,
    },
    /// Receive messages from a peer over UDP and print them.
    Receive {
        /// Local address to bind (e.g. 127.0.0.1:9000).
        #[arg(short, long, default_value = "127.0.0.1:9000")]
        bind: SocketAddr,
        /// Address of the sending peer.
        #[arg(short, long, default_value = "127.0.0.1:9001")]
        peer: SocketAddr,
        /// Number of exchanges to complete before exiting.
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Run both roles over an in-memory link and report the outcome.
    Loopback {
        #[arg(short, long, value_parser = parse_task)]
        task: TaskId,
        /// Probability that a frame is lost.
        #[arg(long, default_value_t = 0.0, value_parser = parse_probability)]
        loss: f64,
        /// Probability that a frame has one bit flipped.
        #[arg(long, default_value_t = 0.0, value_parser = parse_probability)]
        corrupt: f64,
        /// Seed for the fault model.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(required = true, value_parser = parse_u32)]
        words: Vec<u32>,
    },
}

/// Protocol timing overrides.
#[derive(Args)]
struct Timing {
    /// Pause around each frame and between attempts.
    #[arg(long, global = true, default_value_t = 50)]
    frame_delay_ms: u64,
    /// Pause between two polls of the transport.
    #[arg(long, global = true, default_value_t = 1000)]
    poll_pause_us: u64,
    /// Polls per listen round.
    #[arg(long, global = true, default_value_t = 1000)]
    poll_iterations: u32,
    /// Listen rounds per receive attempt.
    #[arg(long, global = true, default_value_t = 5)]
    listen_rounds: u32,
    /// Attempts per sender step.
    #[arg(long, global = true, default_value_t = 5)]
    max_tries: u32,
}

impl Timing {
    fn config(&self) -> ProtocolConfig {
        ProtocolConfig::default()
            .with_frame_delay(Duration::from_millis(self.frame_delay_ms))
            .with_poll_pause(Duration::from_micros(self.poll_pause_us))
            .with_poll_iterations(self.poll_iterations)
            .with_listen_rounds(self.listen_rounds)
            .with_max_tries(self.max_tries)
    }
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("{s:?}: {e}"))
}

fn parse_task(s: &str) -> Result<TaskId, String> {
    let value = parse_u32(s)?;
    let value = u16::try_from(value).map_err(|_| format!("task {s} out of range"))?;
    TaskId::new(value).map_err(|e| e.to_string())
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{s:?}: {e}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{p} is not a probability"))
    }
}

fn print_message(message: &Message) {
    println!("task {} ({} words)", message.task(), message.quantity());
    for (i, word) in message.words().iter().enumerate() {
        println!("  [{i:2}] {word:#010x}");
    }
}

fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.timing.config();

    match cli.mode {
        Mode::Send {
            bind,
            peer,
            task,
            words,
        } => {
            let message = Message::new(task, words)?;
            let transport = UdpTransport::bind(bind, peer)
                .with_context(|| format!("binding {bind}"))?;
            log::info!("Sending task {task} from {} to {peer}", transport.local_addr);
            let mut conn = Connection::new(transport, config)?;
            conn.send(&message).context("send failed")?;
            println!("delivered task {task}");
        }
        Mode::Receive { bind, peer, count } => {
            let transport = UdpTransport::bind(bind, peer)
                .with_context(|| format!("binding {bind}"))?;
            log::info!("Receiving on {} from {peer}", transport.local_addr);
            let mut conn = Connection::new(transport, config)?;
            let mut done = 0;
            while done < count {
                match conn.receive() {
                    Ok(message) => {
                        print_message(&message);
                        done += 1;
                    }
                    Err(e) => log::info!("exchange failed: {e}; listening again"),
                }
            }
        }
        Mode::Loopback {
            task,
            loss,
            corrupt,
            seed,
            words,
        } => {
            let message = Message::new(task, words)?;
            let faults = FaultConfig {
                loss_rate: loss,
                corrupt_rate: corrupt,
                seed,
            };
            let (sender_end, receiver_end) = LoopbackLink::pair(faults);

            let receiver_config = config.clone();
            let receiver = thread::spawn(move || {
                let mut conn = Connection::new(receiver_end, receiver_config)?;
                let result = conn.receive();
                anyhow::Ok((result, conn.transport().stats()))
            });

            let mut conn = Connection::new(sender_end, config)?;
            let sent = conn.send(&message);
            let sender_stats = conn.transport().stats();

            let (received, receiver_stats) = receiver
                .join()
                .map_err(|_| anyhow!("receiver thread panicked"))??;

            println!("sender:   {sender_stats:?}");
            println!("receiver: {receiver_stats:?}");
            match received {
                Ok(got) => {
                    print_message(&got);
                    if got != message {
                        println!("received message differs from the one sent");
                    }
                }
                Err(e) => println!("receive failed: {e}"),
            }
            sent.context("send failed")?;
        }
    }

    Ok(())
}
