use crate::board::Side;
use crate::bot::Bot;
use crate::game::{Action, GameConfig, GameState, Mode};
use std::time::{Duration, Instant};

pub struct MatchConfig {
    pub time_per_action: Duration,
    /// Play-phase actions before the match is called a draw.
    pub max_actions: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            time_per_action: Duration::from_secs(2),
            max_actions: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    SouthWin { winner_name: String, actions: usize },
    NorthWin { winner_name: String, actions: usize },
    Draw { actions: usize },
    Timeout { violator: String, winner: String },
    IllegalAction { violator: String, winner: String },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::SouthWin { winner_name, .. } => Some(winner_name),
            MatchResult::NorthWin { winner_name, .. } => Some(winner_name),
            MatchResult::Timeout { winner, .. } => Some(winner),
            MatchResult::IllegalAction { winner, .. } => Some(winner),
            MatchResult::Draw { .. } => None,
        }
    }
}

/// Two bots playing one game, every phase from placement to the end.
pub struct Match {
    config: MatchConfig,
    state: GameState,
    south_bot: Box<dyn Bot>,
    north_bot: Box<dyn Bot>,
    verbose: bool,
}

impl Match {
    pub fn new(
        south_bot: Box<dyn Bot>,
        north_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
    ) -> Self {
        Self::with_first_side(south_bot, north_bot, config, verbose, Side::South)
    }

    pub fn with_first_side(
        south_bot: Box<dyn Bot>,
        north_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
        first_side: Side,
    ) -> Self {
        Match {
            config,
            state: GameState::new(GameConfig {
                first_side,
                mode: Mode::PlayerVsPlayer,
            }),
            south_bot,
            north_bot,
            verbose,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    fn bot(&self, side: Side) -> &dyn Bot {
        match side {
            Side::South => self.south_bot.as_ref(),
            Side::North => self.north_bot.as_ref(),
        }
    }

    fn end_game(&mut self) {
        self.south_bot.game_end();
        self.north_bot.game_end();
    }

    pub fn play(&mut self) -> MatchResult {
        self.south_bot.game_start(Side::South);
        self.north_bot.game_start(Side::North);

        if self.verbose {
            println!("Match starting:");
            println!("  South: {}", self.south_bot.name());
            println!("  North: {}", self.north_bot.name());
            println!("  {} places first", self.state.config().first_side);
        }

        while !self.state.is_game_over() && self.state.action_count() < self.config.max_actions {
            if let Some(result) = self.play_action(self.state.active_side()) {
                self.end_game();
                return result;
            }
        }

        self.end_game();

        let actions = self.state.action_count();
        match self.state.winner() {
            Some(Side::South) => {
                if self.verbose {
                    println!("\n{} wins as South!", self.south_bot.name());
                }
                MatchResult::SouthWin {
                    winner_name: self.south_bot.name().to_string(),
                    actions,
                }
            }
            Some(Side::North) => {
                if self.verbose {
                    println!("\n{} wins as North!", self.north_bot.name());
                }
                MatchResult::NorthWin {
                    winner_name: self.north_bot.name().to_string(),
                    actions,
                }
            }
            None => {
                if self.verbose {
                    println!("\nMax actions ({}) reached - Draw!", self.config.max_actions);
                }
                MatchResult::Draw { actions }
            }
        }
    }

    fn play_action(&mut self, side: Side) -> Option<MatchResult> {
        let bot = match side {
            Side::South => &mut self.south_bot,
            Side::North => &mut self.north_bot,
        };

        if self.verbose {
            println!("\n{:?}: {} ({side}) to act", self.state.phase(), bot.name());
            println!("Legal actions: {}", self.state.legal_actions().len());
        }

        let start = Instant::now();
        let action = bot.get_action(&self.state, self.config.time_per_action);
        let elapsed = start.elapsed();

        self.handle_action_result(action, elapsed, side)
    }

    fn handle_action_result(
        &mut self,
        action: Option<Action>,
        elapsed: Duration,
        side: Side,
    ) -> Option<MatchResult> {
        let bot_name = self.bot(side).name().to_string();
        let opponent_name = self.bot(side.opponent()).name().to_string();

        if elapsed > self.config.time_per_action {
            if self.verbose {
                println!(
                    "TIMEOUT: {} took {:?} (limit: {:?})",
                    bot_name, elapsed, self.config.time_per_action
                );
            }
            return Some(MatchResult::Timeout {
                violator: bot_name,
                winner: opponent_name,
            });
        }

        let Some(action) = action else {
            if self.verbose {
                println!("{} returned no action", bot_name);
            }
            return Some(MatchResult::Draw {
                actions: self.state.action_count(),
            });
        };

        if self.verbose {
            println!("{} plays: {} (took {:?})", bot_name, action, elapsed);
        }

        match self.state.apply(side, action) {
            Ok(events) => {
                for event in &events {
                    log::trace!("{event:?}");
                }
            }
            Err(e) => {
                if self.verbose {
                    println!("ILLEGAL ACTION: {} - {}", bot_name, e);
                }
                return Some(MatchResult::IllegalAction {
                    violator: bot_name,
                    winner: opponent_name,
                });
            }
        }

        self.south_bot.notify_action(side, action);
        self.north_bot.notify_action(side, action);

        if self.verbose {
            println!("{}", self.state.display_board());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{GreedyBot, RandomBot};
    use crate::game::Phase;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always submits the same action, legal or not.
    struct StubbornBot(Action);

    impl Bot for StubbornBot {
        fn name(&self) -> &str {
            "stubborn"
        }

        fn get_action(&mut self, _state: &GameState, _time_limit: Duration) -> Option<Action> {
            Some(self.0)
        }
    }

    struct SilentBot;

    impl Bot for SilentBot {
        fn name(&self) -> &str {
            "silent"
        }

        fn get_action(&mut self, _state: &GameState, _time_limit: Duration) -> Option<Action> {
            None
        }
    }

    /// Sleeps past any short limit, and counts `game_end` calls.
    struct SlowBot {
        ended: Arc<AtomicUsize>,
    }

    impl Bot for SlowBot {
        fn name(&self) -> &str {
            "slow"
        }

        fn get_action(&mut self, state: &GameState, time_limit: Duration) -> Option<Action> {
            std::thread::sleep(time_limit * 2);
            state.legal_actions().first().copied()
        }

        fn game_end(&mut self) {
            self.ended.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_random_match_runs_to_completion() {
        let mut game = Match::new(
            Box::new(RandomBot::with_seed("south".to_string(), 1)),
            Box::new(RandomBot::with_seed("north".to_string(), 2)),
            MatchConfig::default(),
            false,
        );
        let result = game.play();
        assert!(matches!(
            result,
            MatchResult::SouthWin { .. } | MatchResult::NorthWin { .. } | MatchResult::Draw { .. }
        ));
        if let MatchResult::Draw { actions } = result {
            assert_eq!(actions, MatchConfig::default().max_actions);
        } else {
            assert!(game.state().is_game_over());
        }
    }

    #[test]
    fn test_greedy_against_random_leaves_setup() {
        let mut game = Match::new(
            Box::new(GreedyBot::new("greedy".to_string())),
            Box::new(RandomBot::with_seed("random".to_string(), 11)),
            MatchConfig {
                time_per_action: Duration::from_secs(5),
                max_actions: 40,
            },
            false,
        );
        game.play();
        assert!(!matches!(
            game.state().phase(),
            Phase::Placement | Phase::StrengthAssignment
        ));
    }

    #[test]
    fn test_illegal_action_forfeits() {
        let first = crate::board::Square::new(0, 7).unwrap();
        let mut game = Match::new(
            Box::new(StubbornBot(Action::Place {
                shape: crate::board::Shape::Triangle,
                square: first,
            })),
            Box::new(SilentBot),
            MatchConfig::default(),
            false,
        );
        let result = game.play();
        assert_eq!(
            result,
            MatchResult::IllegalAction {
                violator: "stubborn".to_string(),
                winner: "silent".to_string(),
            }
        );
        assert_eq!(result.winner(), Some("silent"));
    }

    #[test]
    fn test_no_action_is_a_draw() {
        let mut game = Match::with_first_side(
            Box::new(SilentBot),
            Box::new(SilentBot),
            MatchConfig::default(),
            false,
            Side::North,
        );
        let result = game.play();
        assert_eq!(result, MatchResult::Draw { actions: 0 });
        assert_eq!(result.winner(), None);
        assert_eq!(game.state().active_side(), Side::North);
    }

    #[test]
    fn test_timeout_forfeits_and_ends_game_for_both() {
        let south_ended = Arc::new(AtomicUsize::new(0));
        let north_ended = Arc::new(AtomicUsize::new(0));
        let mut game = Match::new(
            Box::new(SlowBot {
                ended: Arc::clone(&south_ended),
            }),
            Box::new(SlowBot {
                ended: Arc::clone(&north_ended),
            }),
            MatchConfig {
                time_per_action: Duration::from_millis(5),
                max_actions: 10,
            },
            false,
        );
        let result = game.play();
        assert_eq!(
            result,
            MatchResult::Timeout {
                violator: "slow".to_string(),
                winner: "slow".to_string(),
            }
        );
        assert_eq!(south_ended.load(Ordering::SeqCst), 1);
        assert_eq!(north_ended.load(Ordering::SeqCst), 1);
        assert!(game.state().events().is_empty());
    }
}
