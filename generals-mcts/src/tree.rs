//! MCTS tree of joint game states
//!
//! Uses arena allocation: every node lives in one `Vec` owned by the tree,
//! children are index lists and the parent link is a plain index used for
//! lookups only. Dropping the tree frees every node at once.
//!
//! ## Architecture
//! - Level 2: Tree operations (expand, select_child, backpropagate)
//! - Level 3: UCB calculation, candidate priors
//! - Level 4: Statistics, utilities

use generals_core::{Evaluator, Game, Move, PlayerId, PlayerView, Priors};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::SearchError;
use crate::MctsConfig;

// ============================================================================
// TYPES
// ============================================================================

/// Node identifier (index into arena)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// One move (or pass) per player, indexed by player id
pub type JointAction = Vec<Option<Move>>;

/// Visit statistics, with one value accumulator per player
#[derive(Clone, Debug, Default)]
pub struct NodeStats {
    pub visits: u32,
    pub total_value: Vec<f32>,
}

impl NodeStats {
    fn new(players: usize) -> Self {
        Self {
            visits: 0,
            total_value: vec![0.0; players],
        }
    }

    /// Mean backed-up value for `player`, 0 when unvisited
    pub fn mean_value(&self, player: PlayerId) -> f32 {
        if self.visits == 0 {
            return 0.0;
        }
        self.total_value.get(player.index()).copied().unwrap_or(0.0) / self.visits as f32
    }
}

/// Candidate moves kept for one player at an expanded node
#[derive(Clone, Debug, Default)]
pub struct CandidatePriors {
    /// Retained moves with their renormalised priors
    pub moves: Priors,
    /// Prior of passing this tick
    pub pass: f32,
}

impl CandidatePriors {
    /// Prior of an action, `None` being the pass
    pub fn prior(&self, action: Option<&Move>) -> f32 {
        match action {
            Some(mv) => self.moves.get(mv).copied().unwrap_or(0.0),
            None => self.pass,
        }
    }

    /// Candidate actions: retained moves in descending prior order, then the pass
    fn actions(&self) -> Vec<Option<Move>> {
        let mut moves: Vec<(Move, f32)> = self.moves.iter().map(|(m, p)| (*m, *p)).collect();
        moves.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        moves
            .into_iter()
            .map(|(m, _)| Some(m))
            .chain(std::iter::once(None))
            .collect()
    }
}

/// A node in the MCTS tree
#[derive(Clone, Debug)]
pub struct MctsNode {
    /// Game state at this node
    pub state: Game,
    /// Parent node (None for root)
    pub parent: Option<NodeId>,
    /// Joint action that led here (None for root)
    pub joint_action: Option<JointAction>,
    pub children: Vec<NodeId>,
    /// Candidate priors per player, filled on expansion
    pub priors: Vec<CandidatePriors>,
    pub stats: NodeStats,
    expanded: bool,
}

impl MctsNode {
    pub fn new(state: Game, parent: Option<NodeId>, joint_action: Option<JointAction>) -> Self {
        let players = state.player_count();
        Self {
            state,
            parent,
            joint_action,
            children: Vec::new(),
            priors: Vec::new(),
            stats: NodeStats::new(players),
            expanded: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_over()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Not yet expanded
    pub fn is_leaf(&self) -> bool {
        !self.expanded
    }

    /// The action `player` took to reach this node
    pub fn action_of(&self, player: PlayerId) -> Option<&Move> {
        self.joint_action
            .as_ref()
            .and_then(|joint| joint.get(player.index()))
            .and_then(|a| a.as_ref())
    }
}

// ============================================================================
// MCTS TREE (Level 2 - Tree Operations)
// ============================================================================

/// Search tree with arena allocation
#[derive(Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    /// Create a tree whose root holds a copy of `root_state`
    pub fn new(root_state: Game) -> Self {
        Self {
            nodes: vec![MctsNode::new(root_state, None, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total simulations backed up through the root
    pub fn total_simulations(&self) -> u32 {
        self.get(self.root()).stats.visits
    }

    /// Expand a leaf: evaluate every alive player, keep their best
    /// candidates, and add one child per joint action.
    ///
    /// Returns the per-player value vector for the expanded position
    /// (`-1` for eliminated players).
    pub fn expand<E: Evaluator + ?Sized>(
        &mut self,
        node_id: NodeId,
        evaluator: &E,
        config: &MctsConfig,
    ) -> Result<Vec<f32>, SearchError> {
        let node = self.get(node_id);
        let state = &node.state;
        let players = state.player_count();

        let mut values = vec![-1.0; players];
        let mut priors = vec![CandidatePriors::default(); players];

        for info in state.players().iter().filter(|p| p.alive) {
            let view = PlayerView::new(state, info.id);
            let eval = evaluator.evaluate(&view, state.tick(), info.general)?;
            values[info.id.index()] = eval.value.clamp(-1.0, 1.0);
            priors[info.id.index()] = candidates(state, info.id, &eval.priors, config);
        }

        let mut joint_actions: Vec<JointAction> = vec![vec![None; players]];
        for info in state.players().iter().filter(|p| p.alive) {
            let actions = priors[info.id.index()].actions();
            joint_actions = joint_actions
                .into_iter()
                .flat_map(|joint| {
                    actions.iter().map(move |action| {
                        let mut next = joint.clone();
                        next[info.id.index()] = *action;
                        next
                    })
                })
                .collect();
        }

        let children: Vec<MctsNode> = joint_actions
            .into_iter()
            .map(|joint| {
                let mut child_state = state.clone();
                child_state.play_round(&joint);
                MctsNode::new(child_state, Some(node_id), Some(joint))
            })
            .collect();

        tracing::debug!(
            node = node_id.0,
            tick = state.tick(),
            children = children.len(),
            "expanded node"
        );

        let first = self.nodes.len();
        let child_ids: Vec<NodeId> = (first..first + children.len()).map(NodeId).collect();
        self.nodes.extend(children);

        let node = self.get_mut(node_id);
        node.children = child_ids;
        node.priors = priors;
        node.expanded = true;

        Ok(values)
    }

    /// Pick a child on behalf of one uniformly chosen alive player.
    ///
    /// Ties on the best UCB score are broken uniformly at random.
    pub fn select_child<R: Rng>(
        &self,
        node_id: NodeId,
        exploration: f32,
        rng: &mut R,
    ) -> Option<NodeId> {
        let node = self.get(node_id);
        let alive: Vec<PlayerId> = node.state.alive_players().collect();
        let player = *alive.choose(rng)?;

        let mut best: Vec<NodeId> = Vec::new();
        let mut best_score = f32::NEG_INFINITY;
        for &child in &node.children {
            let score = self.ucb(child, player, exploration);
            if score > best_score {
                best_score = score;
                best.clear();
                best.push(child);
            } else if score == best_score {
                best.push(child);
            }
        }
        best.choose(rng).copied()
    }

    // ========================================================================
    // Level 3: UCB
    // ========================================================================

    /// UCB score of `node_id` for `player`.
    ///
    /// `mean + c * prior * sqrt(parent_visits) / (1 + visits)`, or +inf when
    /// the node has never been visited.
    pub fn ucb(&self, node_id: NodeId, player: PlayerId, exploration: f32) -> f32 {
        let node = self.get(node_id);
        if node.stats.visits == 0 {
            return f32::INFINITY;
        }
        let Some(parent) = node.parent.map(|p| self.get(p)) else {
            return node.stats.mean_value(player);
        };

        let prior = parent
            .priors
            .get(player.index())
            .map_or(0.0, |p| p.prior(node.action_of(player)));
        let explore = exploration * prior * (parent.stats.visits as f32).sqrt()
            / (1.0 + node.stats.visits as f32);

        node.stats.mean_value(player) + explore
    }

    // ========================================================================
    // Level 2: Backpropagation
    // ========================================================================

    /// Add `values` to `node_id` and every ancestor up to the root
    pub fn backpropagate(&mut self, node_id: NodeId, values: &[f32]) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.stats.visits += 1;
            for (total, value) in node.stats.total_value.iter_mut().zip(values) {
                *total += value;
            }
            current = node.parent;
        }
    }
}

// ============================================================================
// CANDIDATES (Level 3)
// ============================================================================

/// Keep the `top_k` legal moves by prior, renormalised to share
/// `1 - pass_prior`; the pass gets `pass_prior` (or everything when no move
/// survives the filter).
fn candidates(game: &Game, player: PlayerId, priors: &Priors, config: &MctsConfig) -> CandidatePriors {
    let mut legal: Vec<(Move, f32)> = game
        .legal_moves(player)
        .into_iter()
        .map(|mv| (mv, priors.get(&mv).copied().unwrap_or(0.0).max(0.0)))
        .collect();
    legal.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    legal.truncate(config.top_k);

    if legal.is_empty() {
        return CandidatePriors {
            moves: Priors::default(),
            pass: 1.0,
        };
    }

    let pass = config.pass_prior.clamp(0.0, 1.0);
    let total: f32 = legal.iter().map(|(_, p)| p).sum();
    let share = 1.0 - pass;
    let moves = if total > f32::EPSILON {
        legal.into_iter().map(|(m, p)| (m, share * p / total)).collect()
    } else {
        let uniform = share / legal.len() as f32;
        legal.into_iter().map(|(m, _)| (m, uniform)).collect()
    };

    CandidatePriors { moves, pass }
}

// ============================================================================
// TESTS
// ============================================================================
