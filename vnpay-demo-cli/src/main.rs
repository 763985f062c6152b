//! VNPAY Demo CLI
//!
//! Command-line interface for signing payment requests, checking gateway
//! callbacks, and calling the merchant API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod ui;

use config::ConfigArgs;

#[derive(Parser)]
#[command(name = "vnpay-demo")]
#[command(about = "VNPAY Demo CLI - sign payment requests and verify gateway callbacks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a signed payment page URL
    PayUrl {
        /// Amount in VND
        #[arg(short, long)]
        amount: i64,

        /// Merchant order reference (vnp_TxnRef)
        #[arg(short = 'r', long)]
        order_ref: String,

        /// Order description shown to the customer
        #[arg(short, long)]
        info: String,

        /// Order category
        #[arg(long, default_value = vnpay_lib::order::DEFAULT_ORDER_TYPE)]
        order_type: String,

        /// Customer IP address
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        /// Preselect a bank or payment method (e.g. NCB, VNPAYQR)
        #[arg(long)]
        bank_code: Option<String>,

        /// Payment page language (vn or en)
        #[arg(long)]
        locale: Option<String>,

        /// Also print the URL as a QR code
        #[arg(long)]
        qr: bool,
    },

    /// Verify a browser return URL or query string
    Verify {
        /// Full return URL or its query string
        input: String,
    },

    /// Process an IPN against an in-memory order and print the acknowledgment
    Ipn {
        /// Full IPN URL or its query string
        input: String,

        /// Expected order amount in VND (defaults to the callback's amount)
        #[arg(long)]
        expect_amount: Option<i64>,
    },

    /// Query the gateway for a transaction's status
    Query {
        /// Merchant order reference
        #[arg(short = 'r', long)]
        order_ref: String,

        /// Creation time of the payment (yyyyMMddHHmmss, gateway time)
        #[arg(short = 'd', long)]
        trans_date: String,

        /// IP of the calling server
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,
    },

    /// Refund a settled transaction
    Refund {
        /// Merchant order reference
        #[arg(short = 'r', long)]
        order_ref: String,

        /// Gateway transaction number (vnp_TransactionNo)
        #[arg(short = 'n', long)]
        transaction_no: String,

        /// Amount to refund in VND
        #[arg(short, long)]
        amount: i64,

        /// Refund part of the payment instead of all of it
        #[arg(long)]
        partial: bool,

        /// Creation time of the payment (yyyyMMddHHmmss, gateway time)
        #[arg(short = 'd', long)]
        trans_date: String,

        /// Operator requesting the refund
        #[arg(long, default_value = "vnpay-demo")]
        create_by: String,

        /// IP of the calling server
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "vnpay_demo_cli=debug,vnpay_lib=debug"
    } else {
        "vnpay_demo_cli=info,vnpay_lib=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.resolve();
    if cli.verbose {
        config::show(&config);
    }

    // Dispatch commands
    match cli.command {
        Commands::PayUrl {
            amount,
            order_ref,
            info,
            order_type,
            ip,
            bank_code,
            locale,
            qr,
        } => {
            let mut order = vnpay_lib::OrderRequest::new(order_ref, amount, info, ip)
                .with_order_type(order_type);
            if let Some(bank_code) = bank_code {
                order = order.with_bank_code(bank_code);
            }
            if let Some(locale) = locale {
                order = order.with_locale(locale);
            }
            commands::pay_url::run(config, &order, qr, cli.verbose)?;
        }
        Commands::Verify { input } => {
            commands::verify::run(&config, &input, cli.verbose)?;
        }
        Commands::Ipn {
            input,
            expect_amount,
        } => {
            commands::ipn::run(config, &input, expect_amount, cli.verbose).await?;
        }
        Commands::Query {
            order_ref,
            trans_date,
            ip,
        } => {
            let request = vnpay_lib::api::QueryRequest::new(order_ref, trans_date, ip);
            commands::merchant_api::query(config, &request, cli.verbose).await?;
        }
        Commands::Refund {
            order_ref,
            transaction_no,
            amount,
            partial,
            trans_date,
            create_by,
            ip,
        } => {
            let refund_type = if partial {
                vnpay_lib::api::RefundType::Partial
            } else {
                vnpay_lib::api::RefundType::Full
            };
            let request = vnpay_lib::api::RefundRequest::new(
                order_ref,
                transaction_no,
                amount,
                refund_type,
                create_by,
                trans_date,
                ip,
            );
            commands::merchant_api::refund(config, &request, cli.verbose).await?;
        }
    }

    Ok(())
}
