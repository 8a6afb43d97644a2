//! MCTS Search Loop
//!
//! One simulation:
//! 1. Selection - descend with `select_child` while the node is expanded
//! 2. Expansion - evaluate every alive player and add joint children
//! 3. Terminal scoring - +1 for survivors, -1 for eliminated players
//! 4. Backpropagation - add the value vector up to the root
//!
//! ## Architecture
//! - Level 2: Search loop coordination
//! - Level 3: Policy extraction

use generals_core::{ActionSpace, Evaluator, Game, PlayerId};
use rand::Rng;

use crate::error::SearchError;
use crate::tree::{MctsTree, NodeId};
use crate::MctsConfig;

// ============================================================================
// SEARCH RESULT
// ============================================================================

/// Output of one `run_mcts` call
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Per-player policy over the action space; all zeros for eliminated players
    pub policies: Vec<Vec<f32>>,
    /// Per-player mean root value
    pub values: Vec<f32>,
    /// Simulations backed up through the root
    pub root_visits: u32,
    /// Nodes allocated during the search
    pub nodes: usize,
}

impl SearchResult {
    pub fn policy(&self, player: PlayerId) -> Option<&[f32]> {
        self.policies.get(player.index()).map(Vec::as_slice)
    }
}

// ============================================================================
// SEARCH LOOP (Level 2 - Main Coordination)
// ============================================================================

/// Run `config.simulations` simulations from a fresh root over `initial`.
///
/// The tree is dropped before returning. Evaluator failures abort the search.
pub fn run_mcts<E, R>(
    evaluator: &E,
    initial: &Game,
    config: &MctsConfig,
    rng: &mut R,
) -> Result<SearchResult, SearchError>
where
    E: Evaluator + ?Sized,
    R: Rng,
{
    if config.simulations == 0 {
        return Err(SearchError::ZeroSimulations);
    }

    let mut tree = MctsTree::new(initial.clone());
    for _ in 0..config.simulations {
        run_single_iteration(&mut tree, evaluator, config, rng)?;
    }

    let result = SearchResult {
        policies: root_policies(&tree),
        values: root_values(&tree),
        root_visits: tree.total_simulations(),
        nodes: tree.len(),
    };

    tracing::debug!(
        tick = initial.tick(),
        simulations = config.simulations,
        nodes = result.nodes,
        "search complete"
    );

    Ok(result)
}

/// Single MCTS iteration
fn run_single_iteration<E, R>(
    tree: &mut MctsTree,
    evaluator: &E,
    config: &MctsConfig,
    rng: &mut R,
) -> Result<(), SearchError>
where
    E: Evaluator + ?Sized,
    R: Rng,
{
    // Phase 1: Selection
    let mut current = tree.root();
    while tree.get(current).is_expanded() && !tree.get(current).is_terminal() {
        match tree.select_child(current, config.exploration, rng) {
            Some(child) => current = child,
            None => break,
        }
    }

    // Phase 2/3: Expansion or terminal scoring
    let node = tree.get(current);
    let values = if node.is_terminal() || node.is_expanded() {
        node.state.outcome()
    } else {
        tree.expand(current, evaluator, config)?
    };

    // Phase 4: Backpropagation
    tree.backpropagate(current, &values);
    Ok(())
}

// ============================================================================
// POLICY EXTRACTION (Level 3)
// ============================================================================

/// Visit distribution of each alive player's action across root children.
///
/// When no child has been visited yet, the root's candidate priors are used
/// instead; a player with no candidates at all gets the pass.
fn root_policies(tree: &MctsTree) -> Vec<Vec<f32>> {
    let root = tree.get(tree.root());
    let state = &root.state;
    let space = ActionSpace::new(state.width(), state.height());

    state
        .players()
        .iter()
        .map(|info| {
            let mut policy = vec![0.0f32; space.size()];
            if !info.alive {
                return policy;
            }

            for &child in &root.children {
                let node = tree.get(child);
                policy[space.index_of(node.action_of(info.id))] += node.stats.visits as f32;
            }

            if !normalize(&mut policy) {
                if let Some(priors) = root.priors.get(info.id.index()) {
                    for (mv, p) in &priors.moves {
                        policy[space.index(mv)] = *p;
                    }
                    policy[space.pass_index()] = priors.pass;
                }
                if !normalize(&mut policy) {
                    policy[space.pass_index()] = 1.0;
                }
            }
            policy
        })
        .collect()
}

fn root_values(tree: &MctsTree) -> Vec<f32> {
    let root = tree.get(NodeId::ROOT);
    root.state
        .players()
        .iter()
        .map(|info| root.stats.mean_value(info.id))
        .collect()
}

/// Scale to sum 1; false when the vector is all zeros
fn normalize(policy: &mut [f32]) -> bool {
    let total: f32 = policy.iter().sum();
    if total <= 0.0 {
        return false;
    }
    policy.iter_mut().for_each(|p| *p /= total);
    true
}

// ============================================================================
// TESTS
// ============================================================================
