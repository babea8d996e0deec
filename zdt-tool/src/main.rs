mod cli;

use std::io;
use std::process;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, shells::Bash};
use log::error;

use zdt_lib::port::open_port;
use zdt_lib::protocol::command::HomingConfig;
use zdt_lib::protocol::motor::Motor;
use zdt_lib::protocol::BROADCAST_ADDRESS;

use cli::{Cli, Commands, StructOpt};

enum OutputFormat {
    Plain,
    Json,
}

fn frame_to_string(bytes: &[u8], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Plain => bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<String>>()
            .join(" "),
        OutputFormat::Json => json::stringify(hex::encode(bytes)),
    }
}

fn do_main() -> Result<String> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.debug {
        "debug"
    } else {
        "info"
    }))
    .format_timestamp(None)
    .format_target(false)
    .init();

    let fmt = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };

    if let Commands::Completion = cli.command {
        generate(Bash, &mut Cli::command(), "zdt-tool", &mut io::stdout());
        return Ok(String::new());
    }

    let mut port = open_port(&cli.port, cli.baudrate)?;

    match cli.command {
        Commands::Enable { sync } => {
            Motor::new(port.as_mut(), cli.address).enable(true, sync)?;
        }
        Commands::Disable { sync } => {
            Motor::new(port.as_mut(), cli.address).enable(false, sync)?;
        }
        Commands::Velocity {
            direction,
            velocity,
            acceleration,
            sync,
        } => {
            Motor::new(port.as_mut(), cli.address).velocity(direction, velocity, acceleration, sync)?;
        }
        Commands::Position {
            direction,
            velocity,
            acceleration,
            pulses,
            relative,
            sync,
        } => {
            Motor::new(port.as_mut(), cli.address).position(
                direction,
                velocity,
                acceleration,
                pulses,
                relative,
                sync,
            )?;
        }
        Commands::Stop { sync } => {
            Motor::new(port.as_mut(), cli.address).stop(sync)?;
        }
        Commands::SyncMotion => {
            Motor::new(port.as_mut(), BROADCAST_ADDRESS).sync_motion()?;
        }
        Commands::SyncVelocity {
            addresses,
            direction,
            velocity,
            acceleration,
        } => {
            for &addr in addresses.iter() {
                Motor::new(port.as_mut(), addr).velocity(direction, velocity, acceleration, true)?;
            }
            Motor::new(port.as_mut(), BROADCAST_ADDRESS).sync_motion()?;
        }
        Commands::SyncPosition {
            addresses,
            direction,
            velocity,
            acceleration,
            pulses,
            relative,
        } => {
            for &addr in addresses.iter() {
                Motor::new(port.as_mut(), addr).position(
                    direction,
                    velocity,
                    acceleration,
                    pulses,
                    relative,
                    true,
                )?;
            }
            Motor::new(port.as_mut(), BROADCAST_ADDRESS).sync_motion()?;
        }
        Commands::ResetZero => {
            Motor::new(port.as_mut(), cli.address).reset_zero()?;
        }
        Commands::ReleaseStall => {
            Motor::new(port.as_mut(), cli.address).release_stall()?;
        }
        Commands::SetMode { mode, save } => {
            Motor::new(port.as_mut(), cli.address).set_control_mode(save, mode)?;
        }
        Commands::SetZero { save } => {
            Motor::new(port.as_mut(), cli.address).set_home_point(save)?;
        }
        Commands::ConfigureHoming {
            mode,
            direction,
            velocity,
            timeout_ms,
            stall_velocity,
            stall_current,
            stall_time,
            auto_home,
            save,
        } => {
            let config = HomingConfig {
                save,
                mode,
                direction,
                velocity,
                timeout_ms,
                stall_velocity,
                stall_current_ma: stall_current,
                stall_time_ms: stall_time,
                auto_home,
            };
            Motor::new(port.as_mut(), cli.address).configure_homing(&config)?;
        }
        Commands::Home { mode, sync } => {
            Motor::new(port.as_mut(), cli.address).trigger_homing(mode, sync)?;
        }
        Commands::HomeAbort => {
            Motor::new(port.as_mut(), cli.address).interrupt_homing()?;
        }
        Commands::ReadPosition => {
            let reading = Motor::new(port.as_mut(), cli.address)
                .with_retries(cli.retries)
                .read_position()?;
            return Ok(match fmt {
                OutputFormat::Plain => format!("{:.1}", reading.degrees),
                OutputFormat::Json => json::stringify(reading.degrees),
            });
        }
        Commands::Read { param } => {
            let reply = Motor::new(port.as_mut(), cli.address).read_raw(param)?;
            return Ok(frame_to_string(&reply, fmt));
        }
        Commands::Completion => {
            return Err(anyhow::anyhow!("unexpected command (this is a bug!)"));
        }
    }

    Ok(String::new())
}

fn main() {
    match do_main() {
        Ok(s) => {
            if !s.is_empty() {
                println!("{}", s);
            }
        }
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}
