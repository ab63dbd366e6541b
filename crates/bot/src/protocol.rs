//! The Ants match line protocol.
//! This module exists to turn the server's text stream into grid updates and
//! decision passes, and the resulting orders back into text.
//! It does not own any decision logic.

use std::error::Error;
use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use colony::{Bot, BotConfig, GridOracle, Map, Strategy, TurnReport};
use tracing::{debug, info, warn};

/// Values from the settings block sent before the first turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameSettings {
    pub load_time: u64,
    pub turn_time: u64,
    pub rows: usize,
    pub cols: usize,
    pub turns: u64,
    pub view_radius2: i32,
    pub attack_radius2: i32,
    pub spawn_radius2: i32,
    pub player_seed: u64,
}

struct Match {
    map: Map,
    bot: Bot<Strategy>,
    turn: u64,
}

/// Plays one match: reads the settings block, answers `go` after each turn,
/// and returns once the server sends `end` or closes the stream.
pub fn run<R, W>(input: R, mut output: W, config: BotConfig) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut settings = GameSettings::default();
    let mut current: Option<Match> = None;

    for line in input.lines() {
        let line = line.context("failed to read from the match server")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let Some(keyword) = fields.next() else {
            continue;
        };

        if keyword == "end" {
            info!("match over");
            break;
        }

        let Some(active) = current.as_mut() else {
            match keyword {
                "ready" => {
                    if settings.rows == 0 || settings.cols == 0 {
                        bail!(
                            "settings block gave an empty map ({} rows, {} cols)",
                            settings.rows,
                            settings.cols
                        );
                    }
                    let map = Map::new(settings.rows, settings.cols, settings.view_radius2);
                    let bot = Bot::from_config(config.clone(), settings.player_seed)
                        .context("invalid bot configuration")?;
                    info!(
                        rows = settings.rows,
                        cols = settings.cols,
                        turns = settings.turns,
                        load_time_ms = settings.load_time,
                        turn_time_ms = settings.turn_time,
                        attack_radius2 = settings.attack_radius2,
                        spawn_radius2 = settings.spawn_radius2,
                        "match ready"
                    );
                    current = Some(Match { map, bot, turn: 0 });
                    finish_turn(&mut output)?;
                }
                "turn" => {}
                "w" | "f" | "h" | "a" | "d" => {
                    bail!("map update before the settings block finished: {line:?}");
                }
                _ => read_setting(&mut settings, keyword, fields.next(), line)?,
            }
            continue;
        };

        match keyword {
            "turn" => {
                active.turn = parse(fields.next(), line)?;
                active.map.begin_update();
            }
            "go" => {
                active.map.finish_update();
                let report = active
                    .bot
                    .do_turn(&active.map)
                    .with_context(|| format!("decision pass failed on turn {}", active.turn))?;
                write_orders(&mut output, &active.map, &report)?;
                finish_turn(&mut output)?;
            }
            "w" | "f" | "h" | "a" | "d" => {
                let row: i32 = parse(fields.next(), line)?;
                let col: i32 = parse(fields.next(), line)?;
                match keyword {
                    "w" => active.map.add_water(row, col),
                    "f" => active.map.add_food(row, col),
                    "h" => active.map.add_hill(row, col, parse(fields.next(), line)?),
                    "a" => active.map.add_ant(row, col, parse(fields.next(), line)?),
                    // Dead ants carry no information the decision pass uses.
                    _ => {}
                }
            }
            _ => debug!(line, "ignoring unrecognised line"),
        }
    }
    Ok(())
}

fn read_setting(
    settings: &mut GameSettings,
    key: &str,
    value: Option<&str>,
    line: &str,
) -> Result<()> {
    match key {
        "loadtime" => settings.load_time = parse(value, line)?,
        "turntime" => settings.turn_time = parse(value, line)?,
        "rows" => settings.rows = parse(value, line)?,
        "cols" => settings.cols = parse(value, line)?,
        "turns" => settings.turns = parse(value, line)?,
        "viewradius2" => settings.view_radius2 = parse(value, line)?,
        "attackradius2" => settings.attack_radius2 = parse(value, line)?,
        "spawnradius2" => settings.spawn_radius2 = parse(value, line)?,
        "player_seed" => settings.player_seed = parse(value, line)?,
        _ => debug!(line, "ignoring unrecognised setting"),
    }
    Ok(())
}

fn parse<T>(field: Option<&str>, line: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    let Some(field) = field else {
        bail!("missing field in line {line:?}");
    };
    field.parse().with_context(|| format!("malformed number {field:?} in line {line:?}"))
}

fn write_orders<W: Write>(output: &mut W, map: &Map, report: &TurnReport) -> Result<()> {
    for order in &report.orders {
        let (row, col) = map.row_col(order.cell);
        writeln!(output, "o {row} {col} {}", order.direction.as_char())
            .context("failed to write order")?;
    }
    for observation in &report.observations {
        debug!(?observation, turn = report.turn, "turn observation");
    }
    if report.orders.is_empty() && !map.friendly_ants().is_empty() {
        warn!(turn = report.turn, "no orders issued for a live colony");
    }
    Ok(())
}

fn finish_turn<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "go").context("failed to write go")?;
    output.flush().context("failed to flush orders")
}
