use sajin::*;
use std::time::Duration;

fn main() {
    println!("Sa-Jin - Greedy vs Random");
    println!("========================================\n");

    let south = Box::new(GreedyBot::new("GreedyBot".to_string()));
    let north = Box::new(RandomBot::new("RandomBot".to_string()));

    let config = MatchConfig {
        time_per_action: Duration::from_secs(2),
        max_actions: 300,
    };

    let mut match_game = Match::new(south, north, config, true);
    let result = match_game.play();
    let winner = result.winner().map(str::to_string);

    println!("\n========================================");
    println!("Match Result:");
    match result {
        MatchResult::SouthWin { winner_name, actions } => {
            println!("  {} wins as South in {} actions!", winner_name, actions);
        }
        MatchResult::NorthWin { winner_name, actions } => {
            println!("  {} wins as North in {} actions!", winner_name, actions);
        }
        MatchResult::Draw { actions } => {
            println!("  Draw after {} actions", actions);
        }
        MatchResult::Timeout { violator, winner } => {
            println!("  {} wins by timeout (opponent: {})", winner, violator);
        }
        MatchResult::IllegalAction { violator, winner } => {
            println!("  {} wins by illegal action (opponent: {})", winner, violator);
        }
    }
    if let Some(name) = winner {
        println!("  Winner: {name}");
    }
    println!("========================================");

    match match_game.state().snapshot().to_json() {
        Ok(json) => println!("\nFinal state:\n{json}"),
        Err(e) => eprintln!("could not serialize final state: {e}"),
    }
}
