use clap::Parser;
use std::path::Path;
use ticket_cart::adapters::bridge::render_cart;
use ticket_cart::core::checkout::{CheckoutOutcome, CheckoutSequencer};
use ticket_cart::core::payment_form::PaymentForm;
use ticket_cart::utils::error::ErrorSeverity;
use ticket_cart::utils::{logger, validation::Validate};
use ticket_cart::{
    CartConfig, CartEngine, CartError, CliConfig, Command, ConsoleBridge, EventCatalog, EventId,
    FileStore, KeyValueCartStore, NoDelay, TokioDelay,
};

type Engine = CartEngine<KeyValueCartStore<FileStore>, ConsoleBridge>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if args.log_json || config.log_json() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }
    tracing::debug!("CLI config: {:?}", args);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(args.command, &config).await {
        tracing::error!("❌ {} (Severity: {:?})", e, e.severity());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn load_config(args: &CliConfig) -> ticket_cart::Result<CartConfig> {
    // 找不到設定檔時使用預設值
    let mut config = if Path::new(&args.config).exists() {
        CartConfig::from_file(&args.config)?
    } else {
        CartConfig::default()
    };

    if let Some(store) = &args.store {
        config.store.path = store.clone();
    }
    if let Some(catalog) = &args.catalog {
        config.catalog = Some(ticket_cart::config::toml_config::CatalogConfig {
            path: catalog.clone(),
        });
    }
    Ok(config)
}

fn open_engine(config: &CartConfig, bridge: ConsoleBridge) -> Engine {
    let store = KeyValueCartStore::with_key(FileStore::new(&config.store.path), &config.store.key);
    CartEngine::new(store, bridge)
}

fn load_catalog(config: &CartConfig) -> ticket_cart::Result<EventCatalog> {
    let path = config.catalog_path().ok_or_else(|| CartError::ConfigError {
        message: "no event catalog configured (set [catalog].path or --catalog)".to_string(),
    })?;
    tracing::debug!("Loading event catalog from {}", path);
    EventCatalog::from_file(path)
}

async fn run(command: Command, config: &CartConfig) -> ticket_cart::Result<()> {
    match command {
        Command::Events { category, search } => {
            let catalog = load_catalog(config)?;
            let events = catalog.filter(category.as_deref(), &search);
            if events.is_empty() {
                println!("No events match your search.");
            }
            for event in events {
                println!(
                    "{:<14} {:<28} {:<12} {:<20} {:>8}",
                    event.id, event.title, event.date, event.venue, event.price
                );
            }
        }
        Command::Add { event_id, quantity } => {
            let catalog = load_catalog(config)?;
            let listing = catalog.require(&event_id)?;
            let mut engine = open_engine(config, ConsoleBridge::new());
            let outcome = engine.add_listing(listing, quantity)?;
            println!(
                "✅ {} ticket(s) for {} in cart",
                outcome.item.quantity(),
                outcome.item.title
            );
        }
        Command::Set { event_id, quantity } => {
            let mut engine = open_engine(config, ConsoleBridge::new());
            match engine.set_quantity(&EventId::new(event_id), quantity)? {
                Some(item) => println!("Updated quantity to {}", item.quantity()),
                None => println!("Nothing to update"),
            }
        }
        Command::Adjust { event_id, delta } => {
            let mut engine = open_engine(config, ConsoleBridge::new());
            match engine.adjust_quantity(&EventId::new(event_id), delta)? {
                Some(item) => println!("Updated quantity to {}", item.quantity()),
                None => println!("Nothing to update"),
            }
        }
        Command::Remove { event_id } => {
            let mut engine = open_engine(config, ConsoleBridge::new());
            if let Some(item) = engine.remove(&EventId::new(event_id)) {
                println!("{} removed from cart", item.title);
            }
        }
        Command::Clear => {
            let mut engine = open_engine(config, ConsoleBridge::quiet());
            engine.clear();
            println!("Cart cleared");
        }
        Command::Show => {
            let engine = open_engine(config, ConsoleBridge::new());
            println!("{}", render_cart(&engine.snapshot(), &engine.totals()));
        }
        Command::Checkout {
            holder,
            card_number,
            expiry,
            cvv,
            no_delay,
        } => {
            let form = PaymentForm::new(holder, &card_number, &expiry, &cvv);
            form.validate()?;

            let mut engine = open_engine(config, ConsoleBridge::quiet());
            let outcome = if no_delay {
                CheckoutSequencer::new(NoDelay, config.processing_delay())
                    .checkout(&mut engine)
                    .await?
            } else {
                println!("Processing...");
                CheckoutSequencer::new(TokioDelay, config.processing_delay())
                    .checkout(&mut engine)
                    .await?
            };

            match outcome {
                CheckoutOutcome::Succeeded(receipt) => {
                    println!("{}", render_cart(&receipt.items, &receipt.totals));
                    println!(
                        "✅ Payment successful! Booking {} charged to {}",
                        receipt.reference,
                        form.masked_card_number()
                    );
                }
                CheckoutOutcome::Failed { reason } => {
                    println!("❌ Checkout failed: {}", reason);
                }
            }
        }
    }

    Ok(())
}
