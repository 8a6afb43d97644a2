//! Integration tests for the generals engine
//!
//! Tests the full stack: game rules, fog of war, evaluators, persistence,
//! MCTS, and self-play export

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};

use generals_core::persist::{self, EvaluatorMeta};
use generals_core::{
    encode, reward, ActionSpace, Board, Coord, Direction, Evaluator, Game, HeuristicEvaluator,
    Move, PlayerId, PlayerView, Tile, TileType, TrainingContext, UniformEvaluator, ViewType,
    PLANES,
};
use generals_mcts::selfplay::{play_game, run_self_play, write_jsonl};
use generals_mcts::{run_mcts, MctsConfig, SelfPlayConfig, TrainingSample};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// 8x8 board with a mountain wall and a neutral city
fn skirmish() -> Game {
    let mut board = Board::new(8, 8);
    for y in 2..6 {
        board[Coord::new(4, y)] = Tile::MOUNTAIN;
    }
    board[Coord::new(2, 6)] = Tile::city(12);
    let mut game = Game::from_board(board, &[Coord::new(1, 1), Coord::new(6, 6)]).unwrap();
    game.set_tile(Coord::new(1, 1), Tile::new(TileType::General, Some(P0), 30));
    game.set_tile(Coord::new(6, 6), Tile::new(TileType::General, Some(P1), 30));
    game
}

fn quick_selfplay() -> SelfPlayConfig {
    SelfPlayConfig {
        min_size: 6,
        max_size: 8,
        players: 2,
        max_ticks: 12,
        games: 2,
        seed: Some(100),
        temperature: 0.5,
        threads: 1,
        feature_width: 8,
        feature_height: 8,
        mcts: MctsConfig {
            simulations: 8,
            top_k: 3,
            ..MctsConfig::default()
        },
        ..SelfPlayConfig::default()
    }
}

// ============================================================================
// GAME RULES
// ============================================================================

#[test]
fn test_generated_games_are_valid() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for (size, players) in [(18, 2), (20, 3), (25, 4), (25, 8)] {
        let game = Game::new(size, size, players, &mut rng).unwrap();
        assert_eq!(game.players().len(), players);
        assert_eq!(game.alive_count(), players);
        for info in game.players() {
            let tile = game.tile(info.general).unwrap();
            assert_eq!(tile.kind, TileType::General);
            assert_eq!(tile.army, 1);
            assert_eq!(tile.owner, Some(info.id));
        }
    }
}

#[test]
fn test_march_and_capture_sequence() {
    let mut game = skirmish();

    // Push the general's army down toward the city, then take it
    let moves = [
        Move::new(P0, Coord::new(1, 1), Direction::Down),
        Move::new(P0, Coord::new(1, 2), Direction::Down),
        Move::new(P0, Coord::new(1, 3), Direction::Down),
        Move::new(P0, Coord::new(1, 4), Direction::Down),
        Move::new(P0, Coord::new(1, 5), Direction::Down),
    ];
    for mv in moves {
        game.play_round(&[Some(mv), None]);
    }
    let at = *game.tile(Coord::new(1, 6)).unwrap();
    assert_eq!(at.owner, Some(P0));
    assert!(at.army > 12);

    game.play_round(&[Some(Move::new(P0, Coord::new(1, 6), Direction::Right)), None]);
    let city = game.tile(Coord::new(2, 6)).unwrap();
    assert_eq!(city.kind, TileType::City);
    assert_eq!(city.owner, Some(P0));
    assert_eq!(game.tick(), 6);
}

#[test]
fn test_mountain_wall_blocks_moves() {
    let mut game = skirmish();
    game.set_tile(Coord::new(3, 3), Tile::land(P0, 9));
    let before = game.clone();
    game.apply(Move::new(P0, Coord::new(3, 3), Direction::Right));
    assert_eq!(game, before);
}

#[test]
fn test_fog_hides_enemy_behind_wall() {
    let game = skirmish();
    let view = PlayerView::new(&game, P0);
    let enemy = view.tile(Coord::new(6, 6)).unwrap();
    assert_eq!(enemy.kind, ViewType::UnknownObstacles);
    assert_eq!(enemy.owner, None);
    assert_eq!(enemy.army, 0);

    let own = view.tile(Coord::new(1, 1)).unwrap();
    assert_eq!(own.army, 30);
}

// ============================================================================
// EVALUATORS AND PERSISTENCE
// ============================================================================

#[test]
fn test_saved_evaluator_round_trip_drives_search() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("champ").join("champ.json");
    let tuned = HeuristicEvaluator {
        city_bonus: 10.0,
        ..HeuristicEvaluator::default()
    };
    persist::save(&tuned, &EvaluatorMeta::new(P0, 8, 8), &path).unwrap();

    let (loaded, meta): (HeuristicEvaluator, _) =
        persist::load_or_fresh(&path, EvaluatorMeta::new(P1, 25, 25));
    assert_eq!(loaded, tuned);
    assert_eq!(meta.player, P0);

    let game = skirmish();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let result = run_mcts(&loaded, &game, &MctsConfig { simulations: 30, ..Default::default() }, &mut rng)
        .unwrap();
    assert_eq!(result.root_visits, 30);
    for policy in &result.policies {
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_dynamic_dispatch_evaluators() {
    let game = skirmish();
    let evaluators: Vec<Box<dyn Evaluator>> =
        vec![Box::new(UniformEvaluator), Box::new(HeuristicEvaluator::default())];
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for evaluator in &evaluators {
        let result = run_mcts(evaluator.as_ref(), &game, &MctsConfig::default(), &mut rng).unwrap();
        assert_eq!(result.root_visits, MctsConfig::default().simulations);
        assert!(result.values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}

#[test]
fn test_encoding_matches_action_space() {
    let game = skirmish();
    let view = PlayerView::new(&game, P0);
    let features = encode(&view, game.tick(), Coord::new(1, 1), 10, 10).unwrap();
    assert_eq!(features.data.len(), PLANES * 100);

    let space = ActionSpace::new(game.width(), game.height());
    for mv in view.legal_moves() {
        let index = space.index(&mv);
        assert_eq!(space.decode(index, P0), Ok(Some(mv)));
    }
}

#[test]
fn test_training_context_tracks_baseline() {
    let mut game = skirmish();
    let mut ctx = TrainingContext::new();
    let first = ctx.observe(&game, P0);
    assert_eq!(first.advantage, 0.0);

    for _ in 0..5 {
        game.next_tick();
    }
    let later = ctx.observe(&game, P0);
    assert!(later.reward > first.reward);
    assert!(later.advantage > 0.0);
    assert!((reward(&game, P0) - later.reward).abs() < 1e-6);
}

// ============================================================================
// SELF-PLAY
// ============================================================================

#[test]
fn test_selfplay_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples.jsonl");
    let config = quick_selfplay();

    let mut expected = 0;
    {
        let mut writer = BufWriter::new(File::create(&path).unwrap());
        let games = run_self_play(&HeuristicEvaluator::default(), &config, |record| {
            expected += record.samples.len();
            write_jsonl(&mut writer, &record.samples)
        })
        .unwrap();
        assert_eq!(games, 2);
    }

    let reader = BufReader::new(File::open(&path).unwrap());
    let samples: Vec<TrainingSample> = reader
        .lines()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect();
    assert_eq!(samples.len(), expected);

    // Every sample of a game carries the same final value vector
    for seed in [100, 101] {
        let values: Vec<&Vec<f32>> = samples
            .iter()
            .filter(|s| s.game_seed == seed)
            .map(|s| &s.value)
            .collect();
        assert!(!values.is_empty());
        assert!(values.windows(2).all(|w| w[0] == w[1]));
        assert!(values[0].iter().all(|v| *v == 1.0 || *v == -1.0));
    }
}

#[test]
fn test_selfplay_policies_only_cover_legal_actions() {
    let config = quick_selfplay();
    let record = play_game(&UniformEvaluator, &config, 33).unwrap();
    let space = ActionSpace::new(record.width, record.height);

    for sample in &record.samples {
        let policy = &sample.policies[sample.player.index()];
        assert_eq!(policy.len(), space.size());
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        assert_eq!(sample.root_values.len(), record.players);
    }
}
