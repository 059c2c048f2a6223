//! Concept Arena - terminal front-end
//!
//! Plays a match in the terminal. The orchestrator runs on the tokio runtime;
//! a plain thread reads stdin and turns each line into a game event.

use clap::Parser;
use concept_arena::battle::{
    ActiveAttack, Animator, BattleState, ConceptCorpus, GameEvent, OfflineOracle, Orchestrator,
    Presenter, ResolutionOracle, StandoffStop, StaticCorpus, TurnRecord, TurnResult,
};
use concept_arena::core::error::Result;
use concept_arena::core::types::{BoxFuture, Side, VisualRef};
use concept_arena::core::GameConfig;
use concept_arena::llm::LlmOracle;
use concept_arena::onboarding::ScriptedBattle;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "concept-arena")]
#[command(about = "Defend your tower with words: the AI attacks with a concept, you answer with another")]
struct Args {
    /// TOML file overriding the default match configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON concept list for the AI (`["Fire", ...]` or `[{"name": "Fire"}, ...]`)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Seed for the AI's concept picks
    #[arg(long)]
    seed: Option<u64>,

    /// Go straight to free play
    #[arg(long)]
    skip_tutorial: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "concept_arena=debug"
    } else {
        "concept_arena=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if args.skip_tutorial {
        config.skip_tutorial = true;
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let corpus: Box<dyn ConceptCorpus> = match &args.corpus {
        Some(path) => match StaticCorpus::from_json_file(path, seed) {
            Ok(corpus) => {
                tracing::info!(concepts = corpus.len(), "concept corpus loaded");
                Box::new(corpus)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load concept corpus, using built-in list");
                Box::new(StaticCorpus::fallback(seed))
            }
        },
        None => Box::new(StaticCorpus::fallback(seed)),
    };

    let oracle: Arc<dyn ResolutionOracle> = match LlmOracle::from_env(config.max_damage) {
        Ok(oracle) => Arc::new(oracle),
        Err(e) => {
            tracing::warn!(error = %e, "no judge configured, every battle will be neutral");
            Arc::new(OfflineOracle)
        }
    };

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let animator = Arc::new(TerminalAnimator::default());
    let (orchestrator, events) = Orchestrator::new(
        config,
        oracle,
        corpus,
        animator,
        Box::new(TerminalPresenter::default()),
    );

    print_welcome();
    spawn_input_thread(orchestrator.sender());
    let _ = orchestrator.sender().send(GameEvent::Start);

    let finished = rt.block_on(orchestrator.run(events));
    print_summary(finished.battle());
    Ok(())
}

fn print_welcome() {
    println!("\n=== CONCEPT ARENA ===");
    println!("The AI attacks your tower with a concept. Type a concept to defend with.");
    println!();
    println!("Commands:");
    println!("  <any text>   - Defend with that concept");
    println!("  /next        - Dismiss a tutorial hint or lesson");
    println!("  /skip        - Skip the tutorial");
    println!("  /restart     - Start a new match");
    println!("  /quit        - Exit");
    println!();
}

fn print_summary(battle: &BattleState) {
    println!("\n=== MATCH SUMMARY ===");
    println!(
        "Battles: {}   AI tower: {}   Your tower: {}",
        battle.battle_count(),
        battle.attacker_health(),
        battle.defender_health()
    );
    for (i, record) in battle.history().iter().enumerate() {
        println!(
            "{:>3}. {} vs {} -> {} ({})",
            i + 1,
            record.attacking,
            record.defending,
            record.result.label(),
            record.damage
        );
    }
}

/// Reads stdin on a plain thread; the runtime never blocks on the terminal
fn spawn_input_thread(events: UnboundedSender<GameEvent>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = match line.trim() {
                "" => continue,
                "/next" | "/n" => GameEvent::Acknowledge,
                "/skip" => GameEvent::SkipTutorial,
                "/restart" => GameEvent::Restart,
                "/quit" | "/q" => break,
                text => GameEvent::Defend(text.to_string()),
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(GameEvent::Shutdown);
    });
}

#[derive(Default)]
struct TerminalPresenter {
    last_second: Option<u64>,
}

impl Presenter for TerminalPresenter {
    fn attack_started(&mut self, attack: &ActiveAttack, window: Duration) {
        self.last_second = None;
        println!(
            "\n>>> AI attacks with: {}   ({}s to answer)",
            attack.concept.to_uppercase(),
            window.as_secs()
        );
        prompt();
    }

    fn timer(&mut self, remaining: Duration) {
        let second = remaining.as_secs();
        // Announce the last five seconds only
        if second < 5 && self.last_second != Some(second) {
            self.last_second = Some(second);
            println!("    ... {}s", second + 1);
        }
    }

    fn defending(&mut self, concept: &str) {
        println!("You defend with: {}", concept.to_uppercase());
    }

    fn turn_resolved(&mut self, record: &TurnRecord, state: &BattleState) {
        let damage = match record.result {
            TurnResult::Undefended => format!("{} damage to your tower", record.damage),
            TurnResult::Resolved(_) if record.damage == 0 => "no damage".to_string(),
            TurnResult::Resolved(_) => format!("{} damage", record.damage),
        };
        println!("\n*** {} *** ({damage})", record.result.label().to_uppercase());
        println!("{}", record.explanation);
        println!(
            "AI tower: {}   Your tower: {}",
            state.attacker_health(),
            state.defender_health()
        );
    }

    fn message(&mut self, text: &str) {
        println!("{text}");
    }

    fn hint(&mut self, step: usize, total: usize, battle: &ScriptedBattle) {
        println!("\n--- TUTORIAL {}/{} --- {} {}", step + 1, total, battle.emoji, battle.hint_title);
        println!("{}", battle.hint_text);
        println!("(/next to continue)");
    }

    fn lesson(&mut self, step: usize, total: usize, text: &str, is_last: bool) {
        println!("\n--- LESSON {}/{} ---", step + 1, total);
        println!("{text}");
        if is_last {
            println!("(/next to start free play)");
        } else {
            println!("(/next for the next battle)");
        }
    }

    fn paused(&mut self, paused: bool) {
        if !paused {
            prompt();
        }
    }

    fn match_over(&mut self, winner: Side, state: &BattleState) {
        let headline = match winner {
            Side::Defender => "VICTORY! The AI's tower has fallen.",
            Side::Attacker => "DEFEAT. Your tower has fallen.",
        };
        println!("\n=== {headline} === after {} battles", state.battle_count());
        println!("(/restart for a new match, /quit to exit)");
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

#[derive(Default)]
struct TerminalAnimator {
    next_visual: AtomicU64,
    paused: Arc<AtomicBool>,
}

impl Animator for TerminalAnimator {
    fn present_attack(&self, _concept: &str) -> VisualRef {
        VisualRef(self.next_visual.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn play_approach(&self, duration: Duration) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            println!("The concepts rush toward each other...");
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }

    fn start_standoff(&self) -> StandoffStop {
        let paused = Arc::clone(&self.paused);
        let task = tokio::spawn(async move {
            let mut frame = tokio::time::interval(Duration::from_millis(400));
            frame.tick().await;
            loop {
                frame.tick().await;
                if !paused.load(Ordering::Relaxed) {
                    print!(".");
                    let _ = io::stdout().flush();
                }
            }
        });
        StandoffStop::new(move || {
            task.abort();
            println!();
        })
    }

    fn play_outcome(&self, _result: TurnResult) -> BoxFuture<'static, Result<()>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        })
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }
}
