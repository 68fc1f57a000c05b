use commander_deckgen::api::ScryfallClient;
use commander_deckgen::autocomplete::CommanderSuggester;
use commander_deckgen::cache::CachedSource;
use commander_deckgen::collection::OwnedCards;
use commander_deckgen::config::{ClientSettings, DeckConfig};
use commander_deckgen::{Deck, DeckAssembler};
use inquire::{InquireError, MultiSelect, Select, Text};
use log::warn;
use std::env;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use whoami;

type Assembler = DeckAssembler<CachedSource<ScryfallClient>>;

fn load_owned_cards() -> OwnedCards {
    match env::var("OWNED_CARDS_FILE") {
        Ok(path) => match OwnedCards::from_json_file(&path) {
            Ok(owned) => {
                println!("Loaded {} owned cards from {}.", owned.len(), path);
                owned
            }
            Err(e) => {
                warn!("Could not read {}: {}", path, e);
                OwnedCards::new()
            }
        },
        Err(_) => OwnedCards::new(),
    }
}

/// Accepts a decimal comma. Blank or malformed input yields `None`.
fn parse_budget(input: &str) -> Option<f64> {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|b| b.is_finite() && *b >= 0.0)
}

fn ask_options(assembler: &Assembler, mut config: DeckConfig) -> DeckConfig {
    if let Ok(budget) = Text::new("Budget in € (0 for unlimited):")
        .with_default(&config.budget_eur.to_string())
        .prompt()
    {
        config.budget_eur = parse_budget(&budget).unwrap_or(config.budget_eur);
    }
    if let Ok(lands) = Text::new("Number of lands (32-40):")
        .with_default(&config.land_target.to_string())
        .prompt()
    {
        config.land_target = lands.trim().parse().unwrap_or(config.land_target);
    }
    let labels: Vec<String> = assembler
        .catalog()
        .tags
        .iter()
        .map(|tag| tag.label.clone())
        .collect();
    if let Ok(chosen) = MultiSelect::new("Mechanics to favor (up to 5):", labels).prompt() {
        config.mechanics = assembler
            .catalog()
            .tags
            .iter()
            .filter(|tag| chosen.contains(&tag.label))
            .map(|tag| tag.key.clone())
            .collect();
    }
    config
}

async fn pick_commander(assembler: &Assembler, lang: &str) -> Option<String> {
    let suggester = CommanderSuggester::new(assembler.source(), lang);
    let partial = match Text::new("Commander name:").prompt() {
        Ok(partial) => partial,
        Err(_) => return None,
    };
    let suggestions = match suggester.suggest(&partial).await {
        Ok(found) => found.unwrap_or_default(),
        Err(e) => {
            warn!("Suggestions unavailable: {}", e);
            Vec::new()
        }
    };
    if suggestions.is_empty() {
        return Some(partial);
    }

    let labels: Vec<String> = suggestions
        .iter()
        .map(|s| {
            if s.display != s.canonical {
                format!("{} ({}) - {}", s.display, s.canonical, s.type_line)
            } else {
                format!("{} - {}", s.canonical, s.type_line)
            }
        })
        .collect();
    let select_ans: Result<String, InquireError> =
        Select::new("Select a commander:", labels.clone()).prompt();
    match select_ans {
        Ok(label) => labels
            .iter()
            .position(|l| *l == label)
            .map(|i| suggestions[i].canonical.clone()),
        Err(_) => None,
    }
}

fn show_deck(deck: &Deck, owned: &OwnedCards) {
    println!("{}", deck.annotated_list());
    let stats = deck.stats(owned);
    let counts = deck.category_counts();
    println!(
        "Owned: {} ({}%) • Avg CMC: {} • Ramp {} / Draw {} / Removal {} / Wraths {}",
        stats.owned_count,
        stats.owned_pct,
        stats.avg_cmc,
        counts.ramp,
        counts.draw,
        counts.removal,
        counts.wraths
    );
    for (group, count) in &stats.type_counts {
        println!("  {}: {}", group, count);
    }
}

fn save(path: &str, contents: &str) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    println!("Deck saved to {}.", path);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ClientSettings::from_env()?;
    let client = ScryfallClient::new(&settings)?;
    let assembler = DeckAssembler::new(CachedSource::new(client)).with_settings(&settings);
    let base_config = DeckConfig::from_env()?;
    let owned = load_owned_cards();

    let user_name = whoami::username();
    println!("Hi, {}! Let's build a Commander deck.", user_name);

    let mut current: Option<(Deck, DeckConfig)> = None;

    loop {
        let menu_options: Vec<&str> = vec![
            "Random deck",
            "Deck for a commander",
            "Rebalance current deck",
            "Export deck (TXT)",
            "Export deck (JSON)",
            "Exit",
        ];
        let menu_ans: Result<&str, InquireError> =
            Select::new("What would you like to do?", menu_options.clone()).prompt();

        match menu_ans {
            Ok(choice) => match choice {
                "Random deck" => {
                    let config = ask_options(&assembler, base_config.clone());
                    match assembler.generate(&config, &owned).await {
                        Ok(deck) => {
                            show_deck(&deck, &owned);
                            current = Some((deck, config));
                        }
                        Err(e) => println!("Could not build a deck: {}", e),
                    }
                }
                "Deck for a commander" => {
                    let Some(name) = pick_commander(&assembler, &base_config.localized_lang).await
                    else {
                        continue;
                    };
                    let config = ask_options(
                        &assembler,
                        DeckConfig {
                            localized_lang: base_config.localized_lang.clone(),
                            ..DeckConfig::for_commander(&name)
                        },
                    );
                    match assembler.generate(&config, &owned).await {
                        Ok(deck) => {
                            show_deck(&deck, &owned);
                            current = Some((deck, config));
                        }
                        Err(e) => println!("Could not build a deck: {}", e),
                    }
                }
                "Rebalance current deck" => match current.take() {
                    Some((deck, config)) => match assembler.rebalance(&deck, &config, &owned).await {
                        Ok(rebalanced) => {
                            show_deck(&rebalanced, &owned);
                            current = Some((rebalanced, config));
                        }
                        Err(e) => {
                            println!("Rebalance failed: {}", e);
                            current = Some((deck, config));
                        }
                    },
                    None => println!("Generate a deck first."),
                },
                "Export deck (TXT)" => match &current {
                    Some((deck, _)) => save("commander-deck.txt", &deck.export_text())?,
                    None => println!("Generate a deck first."),
                },
                "Export deck (JSON)" => match &current {
                    Some((deck, _)) => save("commander-deck.json", &deck.export_json()?)?,
                    None => println!("Generate a deck first."),
                },
                "Exit" => break,
                _ => println!("Invalid choice"),
            },
            Err(_) => println!("There was an error, please try again"),
        }
    }

    Ok(())
}
