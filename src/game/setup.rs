//! Board construction: the two built-in layouts and randomized token
//! placement.
//!
//! Node graphs are hand-built. Hidden tokens are drawn from per-ruleset
//! bags: fixed entries are always included, random entries are keyed by
//! `next_f64()` draws, and the whole bag is shuffled again before placement
//! so the fixed entries do not cluster. The draw order is part of the
//! deterministic setup; changing it changes every seeded game.

use serde::{Deserialize, Serialize};

use crate::game::board::{Board, MapNode, NodeId};
use crate::game::catalog::{Catalog, EnemyId, StationId, UpgradeId};
use crate::game::token::{Token, TokenKind};
use crate::rng::RandomSource;

/// Which built-in board to play on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardLayout {
    /// The full 146-node board.
    #[default]
    Standard,
    /// A compact 11-node board with fixed token placement, for short games.
    Compact,
}

/// Build a board for the given layout and ruleset. Player tokens are
/// created first so a seat index is also its player's `TokenId`.
#[must_use]
pub fn build_board(
    layout: BoardLayout,
    catalog: &Catalog,
    player_count: usize,
    rng: &mut RandomSource,
) -> Board {
    let mut board = Board::new();
    for _ in 0..player_count {
        board.add_token(Token::player());
    }
    match layout {
        BoardLayout::Standard => build_standard(&mut board, catalog, player_count, rng),
        BoardLayout::Compact => build_compact(&mut board),
    }
    board
}

#[derive(Debug, Clone, Copy)]
enum BagToken {
    Enemy(EnemyId),
    Station(StationId, Option<UpgradeId>),
}

const fn cache(upgrade: UpgradeId) -> BagToken {
    BagToken::Station(StationId::UpgradeCache, Some(upgrade))
}

const fn station(class: StationId) -> BagToken {
    BagToken::Station(class, None)
}

fn nest_bag(expansion: bool) -> Vec<BagToken> {
    let (broods, decoys) = if expansion { (11, 5) } else { (7, 3) };
    let mut bag = vec![BagToken::Enemy(EnemyId::Brood); broods];
    bag.extend(vec![BagToken::Enemy(EnemyId::DecoyBrood); decoys]);
    bag
}

fn enemy_bag(expansion: bool) -> Vec<BagToken> {
    let counts: [(EnemyId, usize); 9] = if expansion {
        [
            (EnemyId::Crawler, 4),
            (EnemyId::Mite, 4),
            (EnemyId::Drifter, 3),
            (EnemyId::Hopper, 3),
            (EnemyId::Shellback, 3),
            (EnemyId::Stinger, 3),
            (EnemyId::Raider, 3),
            (EnemyId::Whelp, 3),
            (EnemyId::Marauder, 4),
        ]
    } else {
        [
            (EnemyId::Crawler, 3),
            (EnemyId::Mite, 3),
            (EnemyId::Drifter, 2),
            (EnemyId::Hopper, 2),
            (EnemyId::Shellback, 2),
            (EnemyId::Stinger, 2),
            (EnemyId::Raider, 2),
            (EnemyId::Whelp, 2),
            (EnemyId::Marauder, 2),
        ]
    };
    counts
        .iter()
        .flat_map(|&(id, n)| std::iter::repeat_n(BagToken::Enemy(id), n))
        .collect()
}

struct StationBags {
    early_fixed: Vec<BagToken>,
    early_random: Vec<BagToken>,
    late_fixed: Vec<BagToken>,
    late_random: Vec<BagToken>,
}

fn station_bags(expansion: bool) -> StationBags {
    if expansion {
        StationBags {
            early_fixed: vec![cache(UpgradeId::TunnelKit), cache(UpgradeId::MissileRack)],
            early_random: vec![
                cache(UpgradeId::MissileRack),
                cache(UpgradeId::EnergyCell),
                cache(UpgradeId::EnergyCell),
                cache(UpgradeId::ThermalSuit),
                station(StationId::Recharge),
                station(StationId::Recharge),
                station(StationId::SavePoint),
            ],
            late_fixed: vec![cache(UpgradeId::CryoBeam), station(StationId::Recharge)],
            late_random: vec![
                cache(UpgradeId::ChargeAmp),
                cache(UpgradeId::MissileRack),
                cache(UpgradeId::MissileRack),
                cache(UpgradeId::EnergyCell),
                cache(UpgradeId::EnergyCell),
                station(StationId::MapStation),
                station(StationId::SavePoint),
            ],
        }
    } else {
        let refills = vec![
            cache(UpgradeId::MissileRack),
            cache(UpgradeId::MissileRack),
            cache(UpgradeId::EnergyCell),
            cache(UpgradeId::EnergyCell),
        ];
        StationBags {
            early_fixed: vec![cache(UpgradeId::TunnelKit), station(StationId::Recharge)],
            early_random: refills.clone(),
            late_fixed: vec![cache(UpgradeId::ChargeAmp), station(StationId::Recharge)],
            late_random: refills,
        }
    }
}

/// Draw one token per node from a bag of fixed and random entries.
///
/// Fixed entries sort first (key -1.0); random entries get a fresh draw
/// each. After truncating to the node count the surviving tokens are
/// re-keyed and re-sorted so the fixed entries land in random positions
/// too, then placed back to front.
fn place_from_bag(
    board: &mut Board,
    nodes: &[NodeId],
    fixed: &[BagToken],
    random: &[BagToken],
    early: bool,
    rng: &mut RandomSource,
) {
    let mut bag: Vec<(f64, BagToken)> = fixed
        .iter()
        .map(|&t| (-1.0, t))
        .chain(random.iter().map(|&t| (rng.next_f64(), t)))
        .collect();
    bag.sort_by(|a, b| a.0.total_cmp(&b.0));
    bag.truncate(nodes.len());
    for entry in &mut bag {
        entry.0 = rng.next_f64();
    }
    bag.sort_by(|a, b| a.0.total_cmp(&b.0));

    for &node in nodes {
        let Some((_, spec)) = bag.pop() else {
            break;
        };
        let token = match spec {
            BagToken::Enemy(class) => Token::enemy(class),
            BagToken::Station(class, upgrade) => {
                let mut token = Token::station(class, upgrade);
                if let TokenKind::Station(state) = &mut token.kind {
                    state.early = early;
                }
                token
            }
        };
        let id = board.add_token(token);
        board.place(id, node);
    }
}

fn place_ship(board: &mut Board, node: NodeId) {
    let mut ship = Token::station(StationId::Ship, None);
    ship.revealed = true;
    let id = board.add_token(ship);
    board.place(id, node);
    board.nodes[node].is_landing_site = true;
}

const STANDARD_NODE_COUNT: usize = 146;

const STANDARD_TUNNELS: [NodeId; 7] = [15, 32, 44, 45, 67, 86, 92];
const STANDARD_NESTS: [NodeId; 10] = [19, 35, 47, 56, 99, 105, 119, 127, 141, 143];
const STANDARD_ENEMY_NODES: [NodeId; 20] = [
    4, 9, 16, 27, 33, 39, 51, 55, 62, 63, 72, 80, 88, 96, 97, 109, 116, 123, 139, 145,
];
const STANDARD_EARLY_STATION_NODES: [NodeId; 4] = [7, 57, 64, 90];
const STANDARD_LATE_STATION_NODES: [NodeId; 4] = [30, 73, 101, 136];

#[rustfmt::skip]
const STANDARD_LINKS: &[(NodeId, NodeId)] = &[
    // Landing loop and the first ring
    (0, 1), (1, 2), (2, 3), (2, 4), (3, 4), (4, 5), (5, 6), (3, 6), (5, 7),
    (7, 8), (6, 8), (7, 9), (8, 9), (9, 10), (9, 11), (10, 11), (11, 12),
    (12, 13), (13, 14), (14, 15), (14, 16), (16, 17), (17, 18), (17, 19),
    (18, 19), (18, 20), (20, 21), (21, 22), (22, 23), (23, 24), (24, 25),
    (25, 26), (25, 27), (26, 27), (27, 28), (28, 29), (29, 30), (29, 31),
    (31, 32), (31, 33), (33, 34), (34, 35), (35, 36), (36, 37), (37, 38),
    (38, 39), (39, 40), (40, 41), (41, 42), (42, 43), (43, 44), (32, 44),
    (43, 45), (15, 45), (43, 46), (46, 47), (26, 47), (47, 48), (48, 49),
    (49, 50), (50, 51), (13, 51), (51, 52), (52, 53), (53, 54), (54, 55),
    (55, 56), (40, 56), (55, 57), (57, 58), (58, 59), (59, 60), (60, 61),
    (4, 61),
    // Second ring
    (3, 62), (62, 63), (63, 64), (64, 65), (65, 66), (66, 67), (67, 68),
    (68, 69), (69, 70), (70, 71), (70, 72), (71, 72), (72, 73), (73, 74),
    (71, 74), (73, 75), (75, 76), (74, 76), (75, 77), (77, 78), (76, 78),
    (77, 79), (79, 80), (78, 80), (79, 81), (81, 82), (80, 82), (81, 83),
    (83, 84), (84, 85), (85, 86), (86, 87), (87, 88), (88, 89), (89, 90),
    (90, 91), (10, 91), (91, 92), (75, 92),
    // Lower board
    (85, 93), (93, 94), (94, 95), (96, 97), (95, 96), (95, 98), (96, 98),
    (97, 99), (99, 100), (100, 101), (98, 102), (102, 103), (103, 104),
    (104, 105), (93, 106), (106, 107), (107, 108), (108, 109), (109, 110),
    (110, 111), (111, 112), (112, 113), (113, 114), (114, 115), (115, 116),
    (116, 117), (117, 118), (118, 119), (115, 120), (120, 121), (121, 122),
    (122, 123), (122, 124), (123, 125), (125, 126), (123, 126), (126, 127),
    (125, 127), (126, 128), (128, 129), (123, 129), (124, 129), (129, 130),
    (130, 131), (124, 131), (131, 132), (132, 133), (82, 133), (130, 134),
    (134, 135), (130, 135), (134, 136), (136, 137), (135, 137), (135, 138),
    (138, 139), (137, 139), (139, 140), (140, 141), (138, 141), (137, 142),
    (142, 143), (136, 143), (142, 144), (144, 145), (74, 145),
];

fn build_standard(
    board: &mut Board,
    catalog: &Catalog,
    player_count: usize,
    rng: &mut RandomSource,
) {
    for _ in 0..STANDARD_NODE_COUNT {
        board.add_node(MapNode::default());
    }
    for &(a, b) in STANDARD_LINKS {
        board.link(a, b);
    }
    for id in STANDARD_TUNNELS {
        board.nodes[id].is_tunnel = true;
    }
    for id in STANDARD_NESTS {
        board.nodes[id].is_nest = true;
    }

    let expansion = catalog.ruleset().expansion;
    let nests = nest_bag(expansion);
    place_from_bag(board, &STANDARD_NESTS, &nests, &[], false, rng);
    let enemies = enemy_bag(expansion);
    place_from_bag(board, &STANDARD_ENEMY_NODES, &enemies, &[], false, rng);
    let stations = station_bags(expansion);
    place_from_bag(
        board,
        &STANDARD_EARLY_STATION_NODES,
        &stations.early_fixed,
        &stations.early_random,
        true,
        rng,
    );
    place_from_bag(
        board,
        &STANDARD_LATE_STATION_NODES,
        &stations.late_fixed,
        &stations.late_random,
        false,
        rng,
    );

    place_ship(board, 0);
    if catalog.ruleset().players_share_nodes() {
        for seat in 0..player_count {
            board.place(seat, 0);
        }
    } else {
        // One exclusive landing site per player; start nodes are picked as
        // the first decisions of the game.
        for (minimum, node) in [(2, 22), (3, 59), (4, 6)] {
            if player_count >= minimum {
                place_ship(board, node);
            }
        }
    }
}

fn build_compact(board: &mut Board) {
    for _ in 0..11 {
        board.add_node(MapNode::default());
    }
    #[rustfmt::skip]
    let links = [
        (0, 1), (0, 2), (2, 3), (1, 3), (2, 4), (4, 5), (3, 5), (4, 6),
        (6, 7), (5, 7), (7, 8), (8, 9), (8, 10), (10, 1),
    ];
    for (a, b) in links {
        board.link(a, b);
    }
    board.nodes[3].is_superheated = true;
    board.nodes[5].is_superheated = true;
    board.nodes[7].is_nest = true;
    board.nodes[9].is_tunnel = true;

    for (node, class) in [(5, EnemyId::Stinger), (6, EnemyId::Stinger), (7, EnemyId::Brood)] {
        let id = board.add_token(Token::enemy(class));
        board.place(id, node);
    }
    for (node, upgrade) in [
        (8, UpgradeId::TunnelKit),
        (9, UpgradeId::CryoBeam),
        (10, UpgradeId::ThermalSuit),
    ] {
        let id = board.add_token(Token::station(StationId::UpgradeCache, Some(upgrade)));
        board.place(id, node);
    }
    for node in [0, 2, 4, 6] {
        place_ship(board, node);
    }
}
