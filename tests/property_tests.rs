//! Invariants over random action sequences from seeded piece streams.

use arcade_tetris::game::{level_for_lines, Direction, GameState};
use arcade_tetris::piece::RandomPieceProvider;
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Action {
    Left,
    Right,
    Down,
    Rotate,
    Drop,
    HardDrop,
    Pause,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        1 => Just(Action::Left),
        1 => Just(Action::Right),
        1 => Just(Action::Down),
        1 => Just(Action::Rotate),
        3 => Just(Action::Drop),
        2 => Just(Action::HardDrop),
        1 => Just(Action::Pause),
    ]
}

fn apply(state: &GameState, action: Action, provider: &mut RandomPieceProvider) -> GameState {
    match action {
        Action::Left => state.move_piece(Direction::Left),
        Action::Right => state.move_piece(Direction::Right),
        Action::Down => state.move_piece(Direction::Down),
        Action::Rotate => state.rotate(),
        Action::Drop => state.drop_piece(provider),
        Action::HardDrop => state.hard_drop(provider),
        Action::Pause => state.toggle_pause(),
    }
}

fn overlaps_grid(state: &GameState) -> bool {
    state
        .active_cells()
        .any(|cell| state.grid.cell(cell.x, cell.y).is_some_and(|c| c.is_filled()))
}

proptest! {
    #[test]
    fn rollout_keeps_core_invariants(
        seed in any::<u64>(),
        actions in prop::collection::vec(action(), 1..400),
    ) {
        let mut provider = RandomPieceProvider::seeded(seed);
        let mut state = GameState::new(&mut provider);

        for action in actions {
            let next = apply(&state, action, &mut provider);

            prop_assert!(next.score >= state.score);
            prop_assert!(next.lines >= state.lines);
            prop_assert_eq!(next.level, level_for_lines(next.lines));

            if state.is_game_over {
                prop_assert_eq!(&next, &state);
            } else if !next.is_game_over {
                prop_assert!(!overlaps_grid(&next));
                let ghost = next.ghost_position();
                prop_assert!(ghost.y >= next.current_position.y);
                prop_assert_eq!(ghost.x, next.current_position.x);
                prop_assert!(!next.grid.has_collision(&next.current_piece, ghost));
            }

            state = next;
        }
    }

    #[test]
    fn blocked_moves_are_identity(
        seed in any::<u64>(),
        warmup in prop::collection::vec(action(), 0..60),
    ) {
        let mut provider = RandomPieceProvider::seeded(seed);
        let mut state = GameState::new(&mut provider);
        for action in warmup {
            state = apply(&state, action, &mut provider);
        }

        for direction in [Direction::Left, Direction::Right, Direction::Down] {
            let moved = state.move_piece(direction);
            if moved.current_position == state.current_position {
                prop_assert_eq!(&moved, &state);
            }
        }
    }
}
