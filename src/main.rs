use rand::seq::SliceRandom;
use tile_merge::engine::GameEvent;
use tile_merge::persistence::{record_best, MemoryStore, ScoreStore, BEST_SCORE_KEY};
use tile_merge::slide::{legal_moves, SlideConfig, SlideGame};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut store = MemoryStore::new();
    let mut rng = rand::thread_rng();
    let mut game = SlideGame::new(SlideConfig::default(), store.load(BEST_SCORE_KEY).unwrap_or(0))?;
    println!("{}", game.grid());
    let mut move_count = 0;
    while !game.state().is_terminal() {
        let Some(&dir) = legal_moves(game.grid()).choose(&mut rng) else {
            break;
        };
        let out = game.apply_move(dir);
        move_count += 1;
        for e in &out.events {
            if let GameEvent::BestScore(best) = e {
                record_best(&mut store, BEST_SCORE_KEY, *best);
            }
        }
        println!("{dir:?}\n{}", game.grid());
    }
    println!(
        "Moves made: {}, Score: {}, Highest tile: {}, Result: {:?}",
        move_count,
        game.score(),
        game.grid().highest_tile(),
        game.state()
    );
    Ok(())
}
