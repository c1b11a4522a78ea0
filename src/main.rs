mod cli;

use cashout_payouts::{
    config::Config,
    error::{self, PayoutError},
    payout::PayoutEngine,
    paypal::PaypalClient,
    storage::{CashOutScope, Database, Direction, ListParams, OrderBy, SortColumn, PAYPAL_KIND},
    utils,
};
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cashout=info,cashout_payouts=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init => initialize(&config),

        Commands::List {
            sent,
            order,
            limit,
            format,
        } => list_cash_outs(&config, ListParams { sent, order }, limit, &format),

        Commands::Submit { dry_run } => {
            info!("Submitting approved cash outs...");
            submit(&config, dry_run).await
        }

        Commands::Reconcile => {
            info!("Reconciling outstanding payout batches...");
            reconcile(&config).await
        }

        Commands::Auto { interval } => {
            let interval = interval.unwrap_or(config.payout.interval_secs);
            info!("Starting automated payout service (interval: {}s)", interval);
            run_auto_service(&config, interval).await
        }

        Commands::Stats { format } => show_stats(&config, &format),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn open_database(config: &Config) -> error::Result<Database> {
    let db = Database::new(&config.database.path)?;
    db.set_busy_timeout(config.busy_timeout())?;
    Ok(db)
}

fn build_engine(config: &Config) -> error::Result<PayoutEngine<PaypalClient>> {
    config
        .validate_paypal()
        .map_err(|e| PayoutError::Config(e.to_string()))?;

    let db = open_database(config)?;
    let client = PaypalClient::from_config(config)?;

    Ok(PayoutEngine::new(db, client).with_batch_size(config.effective_batch_size()))
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing cash out payout job...".green());
    let _db = open_database(config)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Database:       {}", config.database.path);
    println!("  PayPal Mode:    {:?}", config.paypal.mode);
    println!("  PayPal API:     {}", config.paypal_base_url());
    println!("  Batch Size:     {}", config.effective_batch_size());
    println!("  Interval:       {}s", config.payout.interval_secs);

    if config.validate_paypal().is_err() {
        println!(
            "\n{}",
            "PayPal credentials are not set; submit and reconcile will refuse to run".yellow()
        );
    }
    Ok(())
}

fn list_cash_outs(
    config: &Config,
    params: ListParams,
    limit: Option<usize>,
    format: &str,
) -> error::Result<()> {
    let db = open_database(config)?;

    let mut scope = CashOutScope::all().filter(&params).order(&params);
    if let Some(limit) = limit {
        scope = scope.limit(limit);
    }
    let cash_outs = db.cash_outs(&scope)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&cash_outs)?);
        return Ok(());
    }

    println!("{}", format!("{} cash out(s)", cash_outs.len()).cyan());
    utils::print_table_border(118);
    utils::print_table_row(
        &["ID", "Amount", "Receiver", "State", "Batch", "Created", "Sent"],
        &[8, 12, 28, 16, 20, 24, 24],
    );
    utils::print_table_border(118);

    for cash_out in &cash_outs {
        utils::print_table_row(
            &[
                &cash_out.id.to_string(),
                &utils::format_usd(cash_out.amount_cents),
                &cash_out.paypal_address,
                &cash_out.state().to_string(),
                &cash_out
                    .batch_id
                    .as_deref()
                    .map(utils::format_id)
                    .unwrap_or_else(|| "-".to_string()),
                &utils::format_timestamp(&cash_out.created_at),
                &utils::format_optional_timestamp(cash_out.sent_at.as_ref()),
            ],
            &[8, 12, 28, 16, 20, 24, 24],
        );
    }
    utils::print_table_border(118);

    Ok(())
}

async fn submit(config: &Config, dry_run: bool) -> error::Result<()> {
    let engine = build_engine(config)?;

    if dry_run {
        let chunks = engine.preview_submission()?;
        println!("{}", "DRY RUN: No payouts will be sent".yellow());
        for chunk in &chunks {
            let total: i64 = chunk.cash_outs.iter().map(|c| c.amount_cents).sum();
            println!(
                "  Batch {} - {} cash outs, {}",
                chunk.sender_batch_id,
                chunk.cash_outs.len(),
                utils::format_usd(total)
            );
        }
        if chunks.is_empty() {
            println!("  Nothing to send");
        }
        return Ok(());
    }

    let summary = engine.submit_approved_payouts().await?;
    summary.print_summary();
    Ok(())
}

async fn reconcile(config: &Config) -> error::Result<()> {
    let engine = build_engine(config)?;
    let summary = engine.reconcile_outstanding_batches().await?;
    summary.print_summary();
    Ok(())
}

async fn run_auto_service(config: &Config, interval: u64) -> error::Result<()> {
    println!("{}", "Starting automated payout service...".green());
    println!("Interval: {} seconds", interval);

    let engine = build_engine(config)?;
    let period = tokio::time::Duration::from_secs(interval);

    loop {
        info!("Running payout cycle...");

        match engine.submit_approved_payouts().await {
            Ok(summary) => info!(
                "Submission complete: {} batch(es) created, {} cash outs batched, {} chunk(s) skipped",
                summary.chunks_submitted, summary.records_batched, summary.chunks_not_found
            ),
            Err(e) => warn!("Submission failed: {}", e),
        }

        match engine.reconcile_outstanding_batches().await {
            Ok(summary) => info!(
                "Reconciliation complete: {} sent, {} reset, {} batch(es) pending",
                summary.records_sent, summary.records_reset, summary.batches_pending
            ),
            Err(e) => warn!("Reconciliation failed: {}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping payout service");
                return Ok(());
            }
        }
    }
}

fn show_stats(config: &Config, format: &str) -> error::Result<()> {
    let db = open_database(config)?;
    let stats = db.get_stats(PAYPAL_KIND)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== PayPal Cash Out Statistics ===".cyan().bold());
    println!("\nCash Outs:");
    println!("  Total:             {}", stats.total_cash_outs);
    println!("  Awaiting Approval: {}", stats.awaiting_approval);
    println!("  Ready to Submit:   {}", stats.ready_to_submit.to_string().green());
    println!("  In Flight:         {}", stats.in_flight.to_string().yellow());
    println!("  Sent:              {}", stats.sent.to_string().cyan());

    println!("\nPayouts:");
    println!("  Total Sent:          {}", utils::format_usd(stats.total_sent_cents));
    println!("  Outstanding Batches: {}", stats.outstanding_batches);

    let recent = db.cash_outs(
        &CashOutScope::paypal()
            .sent(true)
            .reorder(OrderBy {
                column: SortColumn::SentAt,
                direction: Direction::Desc,
            })
            .limit(10),
    )?;
    if !recent.is_empty() {
        println!("\n{}", "Recently Sent:".yellow());
        utils::print_table_border(90);
        utils::print_table_row(&["Sent", "ID", "Amount", "Batch"], &[24, 10, 14, 30]);
        utils::print_table_border(90);
        for cash_out in recent {
            utils::print_table_row(
                &[
                    &utils::format_optional_timestamp(cash_out.sent_at.as_ref()),
                    &cash_out.id.to_string(),
                    &utils::format_usd(cash_out.amount_cents),
                    cash_out.batch_id.as_deref().unwrap_or("-"),
                ],
                &[24, 10, 14, 30],
            );
        }
        utils::print_table_border(90);
    }

    Ok(())
}
