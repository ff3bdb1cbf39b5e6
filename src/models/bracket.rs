//! Knockout bracket graph.
//!
//! Nodes live in one arena per side and refer to the nodes feeding them by
//! [`NodeId`] only. A node never owns its feeders or its dependents; the
//! dependency edges are the `sources` back-references, walked in reverse by
//! [`KnockoutBracket::dependents`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::error::{IntegrityFault, TournamentError};
use crate::models::game::{MatchScore, MatchStatus, Side};
use crate::models::player::PlayerId;
use crate::models::rules::RoundRules;

/// Single or double elimination.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationMode {
    #[default]
    Single,
    Double,
}

/// How the qualified players are placed into first-round slots.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Seeding {
    /// Input order is seed rank; standard seed placement (1 v N, 2 v N-1, ...).
    #[default]
    Seeded,
    /// Adjacent players meet in round one; byes go to the last first-round matches.
    InputOrder,
    /// Deterministic shuffle with the given seed, then input-order placement.
    Random { seed: u64 },
}

/// Round designator of a bracket node.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    /// Winner-bracket round with this many players (16 and up).
    RoundOf(u32),
    QuarterFinal,
    SemiFinal,
    Final,
    GrandFinal,
    /// Loser-bracket round, counted from 1.
    LoserRound(u32),
    LoserFinal,
}

impl Round {
    /// Designator of winner-bracket round `round_index` (1-based) in a bracket of `bracket_size` slots.
    pub fn for_winner_round(bracket_size: usize, round_index: u32) -> Self {
        match bracket_size >> (round_index - 1) {
            0..=2 => Round::Final,
            4 => Round::SemiFinal,
            8 => Round::QuarterFinal,
            n => Round::RoundOf(n as u32),
        }
    }

    pub fn is_loser_round(self) -> bool {
        matches!(self, Round::LoserRound(_) | Round::LoserFinal)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::RoundOf(n) => write!(f, "Round of {n}"),
            Round::QuarterFinal => write!(f, "Quarterfinal"),
            Round::SemiFinal => write!(f, "Semifinal"),
            Round::Final => write!(f, "Final"),
            Round::GrandFinal => write!(f, "Grand final"),
            Round::LoserRound(n) => write!(f, "Loser round {n}"),
            Round::LoserFinal => write!(f, "Loser final"),
        }
    }
}

/// Which arena a node lives in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    Winner,
    Loser,
}

/// Stable identity of a bracket node: arena side plus index. Printed as `W3` / `L2`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct NodeId {
    pub side: BracketSide,
    pub index: usize,
}

impl NodeId {
    pub const fn winner(index: usize) -> Self {
        Self {
            side: BracketSide::Winner,
            index,
        }
    }

    pub const fn loser(index: usize) -> Self {
        Self {
            side: BracketSide::Loser,
            index,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.side {
            BracketSide::Winner => 'W',
            BracketSide::Loser => 'L',
        };
        write!(f, "{prefix}{}", self.index)
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let side = match chars.next() {
            Some('W' | 'w') => BracketSide::Winner,
            Some('L' | 'l') => BracketSide::Loser,
            _ => return Err(format!("node id must start with W or L: {s:?}")),
        };
        let index = chars
            .as_str()
            .parse::<usize>()
            .map_err(|e| format!("bad node index in {s:?}: {e}"))?;
        Ok(Self { side, index })
    }
}

/// Contents of one player slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "player")]
pub enum Slot {
    /// The feeding node has not been decided yet.
    #[default]
    Pending,
    Player(PlayerId),
    /// Can never be filled: bracket padding, or fed by a bye that produced nobody.
    Vacant,
}

impl Slot {
    pub fn player(self) -> Option<PlayerId> {
        match self {
            Slot::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_pending(self) -> bool {
        self == Slot::Pending
    }

    pub fn is_vacant(self) -> bool {
        self == Slot::Vacant
    }
}

/// Whether the winner or the loser of a feeding node fills a slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Winner,
    Loser,
}

/// Back-reference from a slot to the node that fills it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub node: NodeId,
    pub kind: FeedKind,
}

impl Feed {
    pub fn winner_of(node: NodeId) -> Self {
        Self {
            node,
            kind: FeedKind::Winner,
        }
    }

    pub fn loser_of(node: NodeId) -> Self {
        Self {
            node,
            kind: FeedKind::Loser,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByeOrigin {
    /// Resolved by the engine because the match could never be contested.
    Automatic,
    /// Given by the organizer.
    Manual,
}

/// A slot that propagation filled; reported to observers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Advancement {
    pub node: NodeId,
    pub side: Side,
    pub slot: Slot,
}

/// A single knockout match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketNode {
    pub id: NodeId,
    pub round: Round,
    /// 1-based round number within this node's side.
    pub round_index: u32,
    /// Position within the round, top to bottom.
    pub position: usize,
    pub slots: [Slot; 2],
    pub sources: [Option<Feed>; 2],
    pub status: MatchStatus,
    pub bye: Option<ByeOrigin>,
    pub score: Option<MatchScore>,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    #[serde(default)]
    pub annotation: String,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BracketNode {
    fn new(id: NodeId, round: Round, round_index: u32, position: usize) -> Self {
        Self {
            id,
            round,
            round_index,
            position,
            slots: [Slot::Pending; 2],
            sources: [None; 2],
            status: MatchStatus::NotStarted,
            bye: None,
            score: None,
            winner: None,
            loser: None,
            annotation: String::new(),
            finished_at: None,
        }
    }

    pub fn slot(&self, side: Side) -> Slot {
        self.slots[side.index()]
    }

    pub fn player(&self, side: Side) -> Option<PlayerId> {
        self.slot(side).player()
    }

    pub fn player_a(&self) -> Option<PlayerId> {
        self.player(Side::A)
    }

    pub fn player_b(&self) -> Option<PlayerId> {
        self.player(Side::B)
    }

    pub fn source(&self, side: Side) -> Option<Feed> {
        self.sources[side.index()]
    }

    pub fn source_a(&self) -> Option<Feed> {
        self.source(Side::A)
    }

    pub fn source_b(&self) -> Option<Feed> {
        self.source(Side::B)
    }

    pub fn seated_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.slots.iter().filter_map(|s| s.player())
    }

    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.player(*side) == Some(player))
    }

    pub fn is_decided(&self) -> bool {
        self.status.is_decided()
    }

    /// Both players seated.
    pub fn is_ready(&self) -> bool {
        self.player_a().is_some() && self.player_b().is_some()
    }

    /// What a winner feed out of this node carries, once known.
    ///
    /// An empty bye (both slots vacant) hands on a vacancy; a manual bye given
    /// before anyone was seated has no answer until its first player arrives.
    pub fn winner_outcome(&self) -> Option<Slot> {
        match self.status {
            MatchStatus::Finished => self.winner.map(Slot::Player),
            MatchStatus::Bye => match self.winner {
                Some(p) => Some(Slot::Player(p)),
                None if self.slots.iter().all(|s| s.is_vacant()) => Some(Slot::Vacant),
                None => None,
            },
            _ => None,
        }
    }

    /// What a loser feed out of this node carries. A bye never produces a loser.
    pub fn loser_outcome(&self) -> Option<Slot> {
        match self.status {
            MatchStatus::Finished => self.loser.map(Slot::Player),
            MatchStatus::Bye => Some(Slot::Vacant),
            _ => None,
        }
    }

    pub fn outcome(&self, kind: FeedKind) -> Option<Slot> {
        match kind {
            FeedKind::Winner => self.winner_outcome(),
            FeedKind::Loser => self.loser_outcome(),
        }
    }

    /// Drop the recorded outcome; slots and annotation stay.
    pub(crate) fn clear_result(&mut self) {
        self.status = MatchStatus::NotStarted;
        self.bye = None;
        self.score = None;
        self.winner = None;
        self.loser = None;
        self.finished_at = None;
    }
}

/// Arena of the nodes of one side, indexed by `NodeId::index`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub side: BracketSide,
    nodes: Vec<BracketNode>,
}

impl Bracket {
    pub fn new(side: BracketSide) -> Self {
        Self {
            side,
            nodes: Vec::new(),
        }
    }

    /// Append an empty node and return its id.
    pub(crate) fn push(&mut self, round: Round, round_index: u32, position: usize) -> NodeId {
        let id = NodeId {
            side: self.side,
            index: self.nodes.len(),
        };
        self.nodes
            .push(BracketNode::new(id, round, round_index, position));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&BracketNode> {
        if id.side != self.side {
            return None;
        }
        self.nodes.get(id.index)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut BracketNode> {
        if id.side != self.side {
            return None;
        }
        self.nodes.get_mut(id.index)
    }

    pub fn nodes(&self) -> &[BracketNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of rounds on this side.
    pub fn rounds(&self) -> u32 {
        self.nodes.iter().map(|n| n.round_index).max().unwrap_or(0)
    }

    pub fn round(&self, round_index: u32) -> impl Iterator<Item = &BracketNode> + '_ {
        self.nodes
            .iter()
            .filter(move |n| n.round_index == round_index)
    }
}

/// The one edge running against round order: the loser-bracket champion
/// enters the grand final in slot B, the winner-bracket champion in slot A.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GrandFinalWiring {
    pub node: NodeId,
    pub winner_final: NodeId,
    pub loser_final: NodeId,
}

impl GrandFinalWiring {
    pub const LOSER_PATH: Side = Side::B;
}

/// Winner bracket, optional loser bracket and the rules they are played under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutBracket {
    pub mode: EliminationMode,
    pub seeding: Seeding,
    /// Number of first-round slots (player count padded to a power of two).
    pub bracket_size: usize,
    pub rules: RoundRules,
    pub winner: Bracket,
    pub loser: Option<Bracket>,
    /// Last node of the winner tree proper (the grand final excluded).
    pub winner_final: NodeId,
    pub grand_final: Option<GrandFinalWiring>,
}

impl KnockoutBracket {
    pub fn node(&self, id: NodeId) -> Option<&BracketNode> {
        match id.side {
            BracketSide::Winner => self.winner.get(id),
            BracketSide::Loser => self.loser.as_ref().and_then(|b| b.get(id)),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut BracketNode> {
        match id.side {
            BracketSide::Winner => self.winner.get_mut(id),
            BracketSide::Loser => self.loser.as_mut().and_then(|b| b.get_mut(id)),
        }
    }

    pub fn require(&self, id: NodeId) -> Result<&BracketNode, TournamentError> {
        self.node(id).ok_or(TournamentError::UnknownNode(id))
    }

    pub fn require_mut(&mut self, id: NodeId) -> Result<&mut BracketNode, TournamentError> {
        self.node_mut(id).ok_or(TournamentError::UnknownNode(id))
    }

    pub fn winner_bracket_nodes(&self) -> &[BracketNode] {
        self.winner.nodes()
    }

    pub fn loser_bracket_nodes(&self) -> &[BracketNode] {
        self.loser.as_ref().map(Bracket::nodes).unwrap_or(&[])
    }

    /// Winner-bracket nodes first, then loser-bracket nodes, each in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &BracketNode> + '_ {
        self.winner_bracket_nodes()
            .iter()
            .chain(self.loser_bracket_nodes().iter())
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    /// Every slot fed by `id`, as (dependent node, slot side).
    pub fn dependents(&self, id: NodeId) -> Vec<(NodeId, Side)> {
        self.nodes()
            .flat_map(|node| {
                Side::BOTH
                    .into_iter()
                    .filter(move |side| node.source(*side).map(|f| f.node) == Some(id))
                    .map(move |side| (node.id, side))
            })
            .collect()
    }

    /// True for the grand-final slot reserved for the loser-bracket champion.
    pub fn is_grand_final_edge(&self, node: NodeId, side: Side, feeder: NodeId) -> bool {
        self.grand_final.is_some_and(|gf| {
            gf.node == node && side == GrandFinalWiring::LOSER_PATH && gf.loser_final == feeder
        })
    }

    /// The node whose winner takes the tournament.
    pub fn final_node(&self) -> NodeId {
        self.grand_final
            .map(|gf| gf.node)
            .unwrap_or(self.winner_final)
    }

    pub fn champion(&self) -> Option<PlayerId> {
        self.node(self.final_node()).and_then(|n| n.winner)
    }

    pub fn open_nodes(&self) -> usize {
        self.nodes().filter(|n| !n.is_decided()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.open_nodes() == 0
    }

    /// Clear every recorded outcome and every propagated slot. First-round
    /// seating (slots without a source) stays.
    pub(crate) fn clear_results(&mut self) {
        let sides = std::iter::once(&mut self.winner).chain(self.loser.as_mut());
        for bracket in sides {
            for node in bracket.nodes.iter_mut() {
                node.clear_result();
                for side in Side::BOTH {
                    if node.source(side).is_some() {
                        node.slots[side.index()] = Slot::Pending;
                    }
                }
            }
        }
    }

    /// Verify the structural invariants of the graph.
    pub fn check_integrity(&self) -> Result<(), IntegrityFault> {
        let mut fed: HashSet<(NodeId, FeedKind)> = HashSet::new();
        for node in self.nodes() {
            for feed in node.sources.iter().flatten() {
                let feeder = self.node(feed.node).ok_or(IntegrityFault::DanglingFeed {
                    node: node.id,
                    feeder: feed.node,
                })?;
                if !fed.insert((feed.node, feed.kind)) {
                    return Err(IntegrityFault::DuplicateFeed {
                        feeder: feed.node,
                        kind: feed.kind,
                    });
                }
                if feeder.id.side == node.id.side {
                    if feeder.round_index >= node.round_index {
                        return Err(IntegrityFault::RoundOrder {
                            node: node.id,
                            feeder: feeder.id,
                        });
                    }
                } else if feeder.id.side == BracketSide::Winner {
                    if feed.kind != FeedKind::Loser {
                        return Err(IntegrityFault::CrossBracketEdge {
                            node: node.id,
                            feeder: feeder.id,
                        });
                    }
                } else {
                    let side = if node.source_a() == Some(*feed) {
                        Side::A
                    } else {
                        Side::B
                    };
                    if !self.is_grand_final_edge(node.id, side, feeder.id) {
                        return Err(IntegrityFault::CrossBracketEdge {
                            node: node.id,
                            feeder: feeder.id,
                        });
                    }
                }
            }
            let foreign = node
                .winner
                .iter()
                .chain(node.loser.iter())
                .any(|p| node.side_of(*p).is_none());
            if foreign || (node.winner.is_some() && node.winner == node.loser) {
                return Err(IntegrityFault::ForeignResult { node: node.id });
            }
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), IntegrityFault> {
        let mut indegree: HashMap<NodeId, usize> = self
            .nodes()
            .map(|n| (n.id, n.sources.iter().flatten().count()))
            .collect();
        let mut ready: VecDeque<NodeId> = self
            .nodes()
            .filter(|n| n.sources.iter().all(Option::is_none))
            .map(|n| n.id)
            .collect();
        let mut visited = 0;
        while let Some(id) = ready.pop_front() {
            visited += 1;
            for (dependent, _) in self.dependents(id) {
                if let Some(degree) = indegree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }
        if visited == indegree.len() {
            return Ok(());
        }
        let stuck = self
            .nodes()
            .find(|n| indegree.get(&n.id).is_some_and(|d| *d > 0))
            .map(|n| n.id)
            .unwrap_or(self.winner_final);
        Err(IntegrityFault::Cycle { node: stuck })
    }
}
