use log::{debug, trace};

use crate::ai::{legal_indices, Agent};
use crate::error::{AgentError, TrainingError};
use crate::game::Game;
use crate::training::metrics::{GameResult, Score};

/// Play one game. `agents[i]` plays seat `i`; `first_seat` moves first.
///
/// The winner receives a reward of +1 and every other seat -1. A game
/// that ends without a winner delivers no reward. `game_over` is called on
/// every agent whether the game finished normally or with an error.
pub fn play_game<G: Game + ?Sized>(
    game: &mut G,
    agents: &mut [&mut dyn Agent],
    first_seat: usize,
) -> Result<GameResult, TrainingError> {
    let players = game.player_count();
    if agents.len() != players {
        return Err(TrainingError::SeatCount {
            expected: players,
            found: agents.len(),
        });
    }

    game.reset();
    for agent in agents.iter_mut() {
        agent.new_game();
    }

    let outcome = play_turns(game, agents, first_seat).and_then(|result| {
        if let Some(winner) = result.winner {
            for (seat, agent) in agents.iter_mut().enumerate() {
                let value = if seat == winner { 1.0 } else { -1.0 };
                agent.reward(value)?;
            }
        }
        Ok(result)
    });

    for agent in agents.iter_mut() {
        agent.game_over();
    }
    outcome
}

fn play_turns<G: Game + ?Sized>(
    game: &mut G,
    agents: &mut [&mut dyn Agent],
    first_seat: usize,
) -> Result<GameResult, TrainingError> {
    let players = agents.len();
    let mut turns = 0;

    while !game.is_finished() {
        let seat = (first_seat + turns) % players;
        let features = game.features(seat);
        let legal = game.legal_actions();

        let action = match agents[seat].select_action(&features, &legal) {
            Ok(action) => action,
            Err(AgentError::NoLegalAction) => {
                debug!("{} has no legal action, ending game", agents[seat].name());
                return Ok(GameResult {
                    winner: None,
                    turns,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !legal.get(action).copied().unwrap_or(false) {
            return Err(TrainingError::IllegalAction {
                agent: agents[seat].name().to_string(),
                action,
                legal: legal_indices(&legal),
            });
        }

        trace!("seat {seat} plays {action}");
        game.apply_action(seat, action)?;
        turns += 1;
    }

    Ok(GameResult {
        winner: game.winner(),
        turns,
    })
}

/// Play `count` games, rotating which seat moves first.
pub fn play_match<G: Game + ?Sized>(
    game: &mut G,
    agents: &mut [&mut dyn Agent],
    count: usize,
) -> Result<Score, TrainingError> {
    let mut score = Score::new(agents.len());
    for i in 0..count {
        let first_seat = i % agents.len().max(1);
        let result = play_game(game, agents, first_seat)?;
        score.record(&result);
    }
    Ok(score)
}
