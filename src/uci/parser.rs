//! UCI command parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    SetOption {
        name: String,
        value: Option<String>,
    },
    Position {
        /// `None` means `startpos`.
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go {
        perft: Option<u32>,
    },
    Stop,
    Quit,
    Bench,
    Unknown(String),
}

/// Parses one line of input. Anything unrecognized becomes
/// [`UciCommand::Unknown`] so the engine can report and carry on.
pub fn parse_command(line: &str) -> UciCommand {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uci") => UciCommand::Uci,
        Some("isready") => UciCommand::IsReady,
        Some("ucinewgame") => UciCommand::NewGame,
        Some("stop") => UciCommand::Stop,
        Some("quit") => UciCommand::Quit,
        Some("bench") => UciCommand::Bench,
        Some("setoption") => parse_setoption(tokens),
        Some("position") => parse_position(tokens),
        Some("go") => parse_go(tokens),
        _ => UciCommand::Unknown(line.trim().to_string()),
    }
}

fn parse_setoption<'a>(tokens: impl Iterator<Item = &'a str>) -> UciCommand {
    // Grammar: setoption name <id words...> [value <value words...>]
    let mut name_parts = Vec::new();
    let mut value_parts = Vec::new();
    let mut in_value = false;
    let mut seen_name = false;
    for token in tokens {
        match token {
            "name" if !seen_name => seen_name = true,
            "value" if !in_value => in_value = true,
            _ if in_value => value_parts.push(token),
            _ if seen_name => name_parts.push(token),
            _ => {}
        }
    }
    UciCommand::SetOption {
        name: name_parts.join(" "),
        value: if in_value {
            Some(value_parts.join(" "))
        } else {
            None
        },
    }
}

fn parse_position<'a>(mut tokens: impl Iterator<Item = &'a str>) -> UciCommand {
    let fen = match tokens.next() {
        Some("startpos") => {
            // Skip the optional "moves" keyword.
            let _ = tokens.next();
            None
        }
        Some("fen") => {
            let mut fields = Vec::new();
            for token in tokens.by_ref() {
                if token == "moves" {
                    break;
                }
                fields.push(token);
            }
            Some(fields.join(" "))
        }
        _ => return UciCommand::Unknown("position".to_string()),
    };
    let moves = tokens.map(str::to_string).collect();
    UciCommand::Position { fen, moves }
}

fn parse_go<'a>(mut tokens: impl Iterator<Item = &'a str>) -> UciCommand {
    let mut perft = None;
    while let Some(token) = tokens.next() {
        if token == "perft" {
            perft = tokens.next().and_then(|depth| depth.parse().ok());
        }
    }
    UciCommand::Go { perft }
}
