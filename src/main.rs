use anyhow::{Context, Result};
use clap::Parser;
use gastroshare::{
    auction::AuctionPhase,
    catalog::Catalog,
    clock::{Clock, SharedClock, SystemClock},
    i18n::{Language, Translations},
    ledger::{Ledger, SharedLedger},
    royalty::{self, PortfolioSummary},
    service::{self, ServiceControl},
};
use std::{collections::BTreeSet, path::PathBuf, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Tokenized restaurant demo: menu figures and live tickers")]
struct Opts {
    /// JSON catalog to load instead of the built-in menu
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, default_value = "en")]
    lang: Language,

    /// Ticker refresh interval
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_for_secs: Option<u64>,
}

fn print_menu(catalog: &Catalog, lang: Language) {
    let t = Translations::builtin();
    for dish in &catalog.dishes {
        info!(
            dish = %dish.id,
            name = dish.name.get(lang),
            "{} {} {}, {} €{:.0}, {} €{:.0}, {} {}, {} {:.0}%",
            t.lookup("detail_vol_monthly", lang),
            dish.volume,
            t.lookup("detail_units", lang),
            t.lookup("mkt_est_yield", lang),
            royalty::monthly_royalty(dish),
            t.lookup("detail_yield_annual", lang),
            royalty::annual_royalty(dish),
            t.lookup("detail_apy", lang),
            royalty::implied_yield_rate(dish),
            t.lookup("detail_royalty", lang),
            dish.royalty_rate * 100.0
        );
        for point in royalty::project_monthly_series(dish, &royalty::DEFAULT_SEASONAL_FACTORS) {
            info!(
                dish = %dish.id,
                month = point.label,
                royalty = %format!("{:.0}", point.value),
                "projection"
            );
        }
    }
}

/// A scripted visit: join, design a pizza, bid on the first open auction
fn demo_session(catalog: &Catalog, ledger: &SharedLedger, clock: &SharedClock) -> Result<()> {
    let mut ledger = ledger.lock();

    if let Some(tier) = catalog.tiers.first() {
        ledger.purchase_membership(tier);
    }

    let add_ons: BTreeSet<_> = catalog
        .add_ons
        .iter()
        .take(2)
        .map(|a| a.id.clone())
        .collect();
    ledger.mint_custom_item(
        "Demo Pizza",
        &add_ons,
        catalog.rules.custom_base_price,
        &catalog.add_on_prices(),
    )?;

    let now = clock.now();
    let target = ledger
        .auctions()
        .filter(|a| a.phase(now) == AuctionPhase::Live)
        .find_map(|a| a.minimum_next_bid().map(|bid| (a.id.clone(), bid)));
    if let Some((auction_id, bid)) = target {
        if let Err(e) = ledger.place_bid(&auction_id, bid, now) {
            warn!(%auction_id, error = %e, "demo bid failed");
        }
    }

    let summary = PortfolioSummary::compute(catalog, &ledger);
    info!(?summary, "portfolio");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();

    let catalog = match &opts.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };
    let clock = SystemClock::new_shared();
    let ledger = Ledger::open(&catalog, clock.now())
        .context("catalog rejected")?
        .into_shared();

    print_menu(&catalog, opts.lang);
    demo_session(&catalog, &ledger, &clock)?;

    let svc_ctr = ServiceControl::new();
    ctrlc::set_handler({
        let svc_ctr = svc_ctr.clone();
        move || {
            eprintln!("Stopping all services...");
            svc_ctr.stop_all();
        }
    })?;

    if let Some(secs) = opts.run_for_secs {
        let svc_ctr = svc_ctr.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            svc_ctr.stop_all();
        });
    }

    let tick = Duration::from_millis(opts.tick_ms);
    for handle in vec![
        svc_ctr.spawn_loop(service::CountdownTicker::new(
            ledger.clone(),
            clock.clone(),
            tick,
        )),
        svc_ctr.spawn_loop(service::OracleFeed::new(&catalog, clock.clone(), tick)),
    ] {
        handle.join()?
    }

    Ok(())
}
