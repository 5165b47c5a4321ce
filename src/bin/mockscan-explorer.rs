#![forbid(unsafe_code)]
//! Browse the mock ledger from the terminal

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use mockscan::blockchain::Block;
use mockscan::cli::{abbreviate, age, build_summary_provider, load_service_from_config};
use mockscan::query::{AddressDetails, SearchOutcome};
use mockscan::summary::{self, Summary};
use mockscan::transaction::{Transaction, TxStatus};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the latest blocks and transactions
    Latest {
        /// How many items of each kind to show
        #[arg(long)]
        count: Option<usize>,
    },
    /// Shows a block by number
    Block { id: u64 },
    /// Shows a transaction by hash
    Tx { hash: String },
    /// Shows balance and history for an address
    Address { address: String },
    /// Resolves a block number, address or hash
    Search { query: String },
    /// Asks the AI provider to explain a block, transaction or address
    Summarize { query: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let (config, service) = load_service_from_config()?;

    match cli.command {
        Commands::Latest { count } => {
            let count = count.unwrap_or(config.explorer.latest_items_count);
            let (blocks, txs) = tokio::join!(
                service.latest_blocks(count),
                service.latest_transactions(count)
            );
            println!("{}", "📦 Latest Blocks".bright_cyan().bold());
            print_blocks(&blocks);
            println!();
            println!("{}", "🔁 Latest Transactions".bright_cyan().bold());
            print_transactions(&txs);
        }
        Commands::Block { id } => match service.block_by_id(id).await {
            Some(block) => print_block(&block),
            None => not_found(&format!("Block #{}", id)),
        },
        Commands::Tx { hash } => match service.transaction_by_hash(&hash).await {
            Some(tx) => print_transaction(&tx),
            None => not_found(&format!("Transaction {}", hash)),
        },
        Commands::Address { address } => match service.address_details(&address).await {
            Some(details) => print_address(&details),
            None => not_found(&format!("Address {}", address)),
        },
        Commands::Search { query } => {
            let result = service.search(&query).await;
            match result.outcome {
                SearchOutcome::Block(block) => print_block(&block),
                SearchOutcome::Transaction(tx) => print_transaction(&tx),
                SearchOutcome::Address(details) => print_address(&details),
                SearchOutcome::NotFound => not_found(&format!("\"{}\"", result.query)),
            }
        }
        Commands::Summarize { query } => {
            let result = service.search(&query).await;
            let prompt = match &result.outcome {
                SearchOutcome::Block(block) => summary::block_prompt(block),
                SearchOutcome::Transaction(tx) => summary::transaction_prompt(tx),
                SearchOutcome::Address(details) => summary::address_prompt(details),
                SearchOutcome::NotFound => {
                    not_found(&format!("\"{}\"", result.query));
                    return Ok(());
                }
            };

            println!("{}", "🤖 Generating summary...".bright_cyan());
            let provider = build_summary_provider(&config);
            print_summary(&provider.generate_summary(&prompt, true).await);
        }
    }

    Ok(())
}

fn not_found(what: &str) {
    println!("{}", format!("❌ {} not found", what).red().bold());
}

fn status_cell(status: TxStatus) -> Cell {
    match status {
        TxStatus::Success => Cell::new("Success").fg(TableColor::Green),
        TxStatus::Failed => Cell::new("Failed").fg(TableColor::Red),
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold).fg(TableColor::Cyan))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_blocks(blocks: &[Block]) {
    let mut table = new_table();
    table.set_header(header(&["Block", "Age", "Miner", "Txns", "Gas Used"]));
    for block in blocks {
        table.add_row(vec![
            Cell::new(format!("#{}", block.id)).fg(TableColor::Yellow),
            Cell::new(age(block.timestamp)),
            Cell::new(abbreviate(&block.miner, 10, 6)),
            Cell::new(block.transaction_count()),
            Cell::new(summary::group_thousands(block.gas_used)),
        ]);
    }
    println!("{table}");
}

fn print_transactions(txs: &[Transaction]) {
    let mut table = new_table();
    table.set_header(header(&["Hash", "Block", "From", "To", "Value", "Status"]));
    for tx in txs {
        let block = tx
            .block_id
            .map(|id| format!("#{}", id))
            .unwrap_or_else(|| "pending".to_string());
        table.add_row(vec![
            Cell::new(abbreviate(&tx.hash, 10, 6)),
            Cell::new(block),
            Cell::new(abbreviate(&tx.from, 10, 6)),
            Cell::new(abbreviate(&tx.to, 10, 6)),
            Cell::new(tx.value),
            status_cell(tx.status),
        ]);
    }
    println!("{table}");
}

fn print_fields(title: &str, fields: Vec<(&str, String)>) {
    println!("{}", title.bright_cyan().bold());
    let mut table = new_table();
    for (name, value) in fields {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(value),
        ]);
    }
    println!("{table}");
}

fn print_block(block: &Block) {
    print_fields(
        &format!("📦 Block #{}", block.id),
        vec![
            ("Hash", block.hash.clone()),
            ("Parent Hash", block.parent_hash.clone()),
            (
                "Timestamp",
                format!("{} ({})", summary::format_timestamp(block.timestamp), age(block.timestamp)),
            ),
            ("Miner", block.miner.clone()),
            ("Transactions", block.transaction_count().to_string()),
            ("Gas Used", summary::group_thousands(block.gas_used)),
            ("Gas Limit", summary::group_thousands(block.gas_limit)),
            ("Size", format!("{} bytes", summary::group_thousands(block.size))),
        ],
    );
    for hash in &block.transaction_hashes {
        println!("  {}", hash.bright_white());
    }
}

fn print_transaction(tx: &Transaction) {
    let block = tx
        .block_id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "pending".to_string());
    let status = match tx.status {
        TxStatus::Success => "Success".green().to_string(),
        TxStatus::Failed => "Failed".red().to_string(),
    };
    print_fields(
        "🔁 Transaction",
        vec![
            ("Hash", tx.hash.clone()),
            ("Status", status),
            ("Block", block),
            (
                "Timestamp",
                format!("{} ({})", summary::format_timestamp(tx.timestamp), age(tx.timestamp)),
            ),
            ("From", tx.from.clone()),
            ("To", tx.to.clone()),
            ("Value", tx.value.to_string()),
            ("Gas Price", tx.gas_price.to_string()),
            ("Gas Used", summary::group_thousands(tx.gas_used)),
        ],
    );
}

fn print_address(details: &AddressDetails) {
    print_fields(
        "📍 Address",
        vec![
            ("Address", details.address.clone()),
            ("Balance", details.balance.clone()),
            ("Transactions", details.transaction_count.to_string()),
        ],
    );
    if !details.transactions.is_empty() {
        print_transactions(&details.transactions);
    }
}

fn print_summary(summary: &Summary) {
    println!();
    println!("{}", summary.text);
    if let Some(sources) = &summary.sources {
        println!();
        println!("{}", "Sources:".bright_green().underline());
        for source in sources {
            let title = if source.title.is_empty() { &source.uri } else { &source.title };
            println!("  - {} {}", title.bright_white(), source.uri.dimmed());
        }
    }
}
