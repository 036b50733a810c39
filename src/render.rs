//! Text rendering of game state for terminal viewing.

// Allow format! with push_str for readability - the allocation overhead is
// negligible for text rendering
#![allow(clippy::format_push_string)]

use crate::game::{Catalog, Command, SeatId, TokenId, TokenKind, TurnEngine, Weapon};

/// Render the full game state as plain text.
///
/// Output format:
/// ```text
/// Turn 7, seat 1 (Frost) to act
///
/// BOARD:
///   3 [site]       Scout(P0)
///   4 [heat]       Raider
///   5 [nest]       ?
///  12 [tunnel]     Recharge Station
///
/// PLAYERS:
///   P0 Scout   hp 7/9  missiles 2/5  score 4  at node 3
///   P1 Frost   hp 5/7  missiles 0/5  score 6  at node 9
///
/// OPTIONS (seat 1):
///   0. move to node 8
///   1. stop here
/// ```
#[must_use]
pub fn render_text(engine: &TurnEngine) -> String {
    let mut output = String::new();
    render_header(&mut output, engine);
    render_board(&mut output, engine);
    render_players(&mut output, engine);
    render_options(&mut output, engine);
    output
}

fn render_header(output: &mut String, engine: &TurnEngine) {
    if engine.is_game_over() {
        output.push_str(&format!("Turn {}, GAME OVER\n", engine.turn()));
        let rankings = engine.final_rankings();
        let places: Vec<String> = rankings
            .iter()
            .enumerate()
            .map(|(place, &seat)| {
                format!("{}. {}", place + 1, seat_label(engine, seat))
            })
            .collect();
        output.push_str(&format!("Final standing: {}\n\n", places.join("  ")));
        return;
    }
    output.push_str(&format!(
        "Turn {}, seat {} ({}) to act\n\n",
        engine.turn(),
        engine.current_seat(),
        character_name(engine, engine.current_seat()),
    ));
}

fn render_board(output: &mut String, engine: &TurnEngine) {
    output.push_str("BOARD:\n");
    let catalog = engine.catalog();
    for (id, node) in engine.board().nodes.iter().enumerate() {
        if node.tokens.is_empty() && !node.is_nest && !node.is_landing_site {
            continue;
        }
        let mut flags = Vec::new();
        if node.is_nest {
            flags.push("nest");
        }
        if node.is_tunnel {
            flags.push("tunnel");
        }
        if node.is_landing_site {
            flags.push("site");
        }
        if node.is_superheated {
            flags.push("heat");
        }
        let flag_str = if flags.is_empty() {
            String::new()
        } else {
            format!("[{}]", flags.join(","))
        };
        let occupants: Vec<String> = node
            .tokens
            .iter()
            .map(|&t| token_label(engine, catalog, t))
            .collect();
        output.push_str(&format!(
            "  {id:>3} {flag_str:<12} {}\n",
            occupants.join("  ")
        ));
    }
    output.push('\n');
}

fn render_players(output: &mut String, engine: &TurnEngine) {
    output.push_str("PLAYERS:\n");
    let catalog = engine.catalog();
    for seat in 0..engine.player_count() {
        let state = engine.player_state(seat);
        let name = character_name(engine, seat);
        let position = engine
            .board()
            .tokens
            .get(seat)
            .and_then(|t| t.node)
            .map_or_else(|| "off board".to_owned(), |n| format!("at node {n}"));
        output.push_str(&format!(
            "  P{seat} {name:<8} hp {}/{}  missiles {}/{}  score {}  {}",
            state.health,
            state.max_health,
            state.missiles,
            state.max_missiles,
            state.score,
            position,
        ));
        if !state.upgrades.is_empty() {
            let names: Vec<&str> = state
                .upgrades
                .iter()
                .map(|&u| catalog.upgrade(u).name)
                .collect();
            output.push_str(&format!("  [{}]", names.join(", ")));
        }
        if !state.is_alive() {
            output.push_str("  DEFEATED");
        }
        output.push('\n');
    }
    output.push('\n');
}

fn render_options(output: &mut String, engine: &TurnEngine) {
    if engine.options().is_empty() {
        return;
    }
    let acting = engine.options()[0].acting_seat(engine.current_seat());
    output.push_str(&format!("OPTIONS (seat {acting}):\n"));
    for (index, option) in engine.options().iter().enumerate() {
        output.push_str(&format!("  {index}. {}\n", describe_command(option)));
    }
}

/// One-line description of a command, for menus and logs.
#[must_use]
pub fn describe_command(command: &Command) -> String {
    match command {
        Command::PickStartLocation { node } => format!("land at node {node}"),
        Command::AcceptDefeat { seat } => format!("seat {seat} accepts defeat"),
        Command::Move { node } => format!("move to node {node}"),
        Command::DodgeAndMove { node } => format!("dodge, then move to node {node}"),
        Command::DodgeAndStop => "dodge, then stop".to_owned(),
        Command::Stop => "stop here".to_owned(),
        Command::Skip => "skip".to_owned(),
        Command::ActivateStation => "activate the station".to_owned(),
        Command::HealthRefillRoll => "roll for a health refill".to_owned(),
        Command::MissileRefillRoll => "roll for a missile refill".to_owned(),
        Command::Attack { weapon, node } => match node {
            Some(node) => format!("attack into node {node} with {}", weapon_label(weapon)),
            None => format!("attack with {}", weapon_label(weapon)),
        },
        Command::PermitAssist { seat, .. } => format!("seat {seat} permits the attack"),
        Command::RejectAssist { seat, .. } => format!("seat {seat} refuses the attack"),
    }
}

fn weapon_label(weapon: &Weapon) -> String {
    if weapon.missile {
        format!("missile (damage {})", weapon.damage)
    } else {
        format!("beam (damage {})", weapon.damage)
    }
}

fn token_label(engine: &TurnEngine, catalog: &Catalog, id: TokenId) -> String {
    let Some(token) = engine.board().tokens.get(id) else {
        return "?".to_owned();
    };
    match &token.kind {
        // Player tokens occupy the first seats of the token list, so the
        // token id is the seat.
        TokenKind::Player(state) => format!(
            "{}(P{id})",
            state.character.map_or("?", |c| catalog.character(c).name)
        ),
        TokenKind::Enemy(state) => {
            if token.revealed {
                catalog.enemy(state.class).name.to_owned()
            } else {
                "?".to_owned()
            }
        }
        TokenKind::Station(state) => {
            if token.revealed {
                catalog.station(state.class).name.to_owned()
            } else {
                "?".to_owned()
            }
        }
    }
}

fn character_name(engine: &TurnEngine, seat: SeatId) -> &'static str {
    engine
        .player_state(seat)
        .character
        .map_or("unpicked", |c| engine.catalog().character(c).name)
}

fn seat_label(engine: &TurnEngine, seat: SeatId) -> String {
    format!("P{seat} ({})", character_name(engine, seat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{BoardLayout, CharacterId, Ruleset};

    fn started_engine() -> TurnEngine {
        let ruleset = Ruleset {
            expansion: true,
            aggressive: false,
        };
        let mut engine = TurnEngine::new(5, 2, ruleset, BoardLayout::Compact);
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.set_character(1, CharacterId::Frost).unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn test_render_text_basic() {
        let engine = started_engine();
        let output = render_text(&engine);
        assert!(output.contains("Turn 0"));
        assert!(output.contains("BOARD:"));
        assert!(output.contains("PLAYERS:"));
        assert!(output.contains("P0 Scout"));
        assert!(output.contains("P1 Frost"));
        assert!(output.contains("OPTIONS"));
    }

    #[test]
    fn test_hidden_tokens_render_masked() {
        let engine = started_engine();
        let output = render_text(&engine);
        // Nothing has been revealed yet, so no enemy name may leak.
        assert!(!output.contains("Brood"));
        assert!(output.contains('?'));
    }

    #[test]
    fn test_describe_commands() {
        assert_eq!(
            describe_command(&Command::Move { node: 8 }),
            "move to node 8"
        );
        assert_eq!(describe_command(&Command::Stop), "stop here");
        let attack = Command::Attack {
            weapon: Weapon::base_beam(),
            node: None,
        };
        assert_eq!(describe_command(&attack), "attack with beam (damage 1)");
    }
}
