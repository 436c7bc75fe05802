//! presale-cli: command-line front end for presale wallets.
//!
//! Creates and inspects wallet records, exports keys, finalizes a purchase
//! from the funding address and lists past purchases of a destination.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use presale_core::address::{EthAddress, FundingAddress};
use presale_core::crypto::keccak256;
use presale_core::ecdsa::preferred_backend;
use presale_net::{
    BlockchainInfo, Esplora, NetConfig, Notifier, SaleNotifier, broadcast_with_fallback, fetch_with_fallback,
    unspent_with_fallback,
};
use presale_wallet::{RecordFormat, Seed, UnlockedWallet, WalletRecord, candidate_txids, detect_purchase};
use zeroize::Zeroizing;

const TERMS_URL: &str = "https://www.ethereum.org/pdfs/TermsAndConditionsOfTheEthereumGenesisSale.pdf";
const AGREEMENT_URL: &str = "https://www.ethereum.org/pdfs/EtherProductPurchaseAgreement.pdf";

const RECOVERY_HINT: &str = "funds at the funding address can always be recovered by running \
     `presale-cli getbtcprivkey` and importing the key into a Bitcoin wallet";

/// Presale wallet command-line interface.
#[derive(Parser)]
#[command(name = "presale-cli")]
#[command(version, about = "Presale wallet: create, inspect and finalize purchases.")]
struct Cli {
    /// Wallet file.
    #[arg(short, long, global = true, default_value = "ethwallet.json")]
    wallet: PathBuf,

    /// Wallet password. Prompted without echo when omitted.
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Seed text for genwallet, used as raw bytes. Random when omitted.
    #[arg(short, long, global = true)]
    seed: Option<String>,

    /// Email stored in a new wallet.
    #[arg(short, long, global = true)]
    email: Option<String>,

    /// Overwrite an existing wallet file without asking.
    #[arg(short, long, global = true)]
    overwrite: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet.
    Genwallet {
        /// Use the Argon2id + AES-256-GCM record format.
        #[arg(long)]
        sealed: bool,
    },
    /// Show the funding (Bitcoin) address to send funds to.
    Getbtcaddress,
    /// Show the destination (Ethereum) address.
    Getethaddress,
    /// Export the funding private key in wallet import format.
    Getbtcprivkey,
    /// Export the destination private key as hex.
    Getethprivkey,
    /// Show the decrypted seed.
    Getseed,
    /// Recover the seed of a wallet.
    Recover,
    /// Spend the funding address into a purchase and broadcast it.
    Finalize {
        /// Credit this destination address instead of the wallet's own.
        eth_address: Option<String>,

        /// Confirm the terms without prompting.
        #[arg(long)]
        yes: bool,
    },
    /// List purchases credited to a destination address.
    List {
        /// Destination address (defaults to the wallet's own).
        eth_address: Option<String>,
    },
    /// Keccak-256 of a string, as hex.
    Sha3 { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match &cli.command {
        Commands::Genwallet { sealed } => genwallet(&cli, *sealed),
        Commands::Getbtcaddress => {
            println!("{}", load_record(&cli.wallet)?.btcaddr);
            Ok(())
        }
        Commands::Getethaddress => {
            println!("{}", load_record(&cli.wallet)?.ethaddr);
            Ok(())
        }
        Commands::Getbtcprivkey => {
            let unlocked = unlock(&cli)?;
            println!("{}", unlocked.funding_wif().as_str());
            Ok(())
        }
        Commands::Getethprivkey => {
            let unlocked = unlock(&cli)?;
            println!("{}", unlocked.destination_key_hex().as_str());
            Ok(())
        }
        Commands::Getseed => {
            let unlocked = unlock(&cli)?;
            println!("{}", seed_text(unlocked.seed()).as_str());
            Ok(())
        }
        Commands::Recover => {
            let unlocked = unlock(&cli)?;
            println!("Your seed is: {}", seed_text(unlocked.seed()).as_str());
            Ok(())
        }
        Commands::Finalize { eth_address, yes } => finalize_purchase(&cli, eth_address.as_deref(), *yes).await,
        Commands::List { eth_address } => list_purchases(&cli, eth_address.as_deref()).await,
        Commands::Sha3 { text } => {
            println!("{}", hex::encode(keccak256(text.as_bytes())));
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries only command output.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create a wallet record and write it to the wallet file.
fn genwallet(cli: &Cli, sealed: bool) -> Result<()> {
    let password = ask_password(cli, true)?;
    let email = match &cli.email {
        Some(email) => email.clone(),
        None => prompt_line("Please enter email: ")?,
    };
    let seed = match &cli.seed {
        Some(s) => parse_seed(s)?,
        None => generate_seed()?,
    };
    let format = if sealed { RecordFormat::Sealed } else { RecordFormat::Legacy };

    let record =
        WalletRecord::create(&seed, password.as_bytes(), &email, format).context("Failed to create wallet")?;

    if !confirm_overwrite(&cli.wallet, cli.overwrite)? {
        println!("Aborted, {} left unchanged", cli.wallet.display());
        return Ok(());
    }
    record.save(&cli.wallet, true).context("Failed to save wallet")?;

    println!("Your intermediate Bitcoin address is: {}", record.btcaddr);
    println!();
    println!("Be absolutely sure to keep the wallet safe and backed up, and do not lose your password.");
    println!();
    println!("Read the following documents before purchasing:");
    println!("  {TERMS_URL}");
    println!("  {AGREEMENT_URL}");
    Ok(())
}

/// Fetch the funding outputs, build and sign the purchase, broadcast it and
/// notify the sale.
async fn finalize_purchase(cli: &Cli, eth_address: Option<&str>, yes: bool) -> Result<()> {
    let record = load_record(&cli.wallet)?;
    let destination = eth_address
        .map(EthAddress::from_hex)
        .transpose()
        .context("Invalid destination address")?;

    let config = NetConfig::from_env().context("Invalid network configuration")?;
    let blockchain_info = BlockchainInfo::from_config(&config)?;
    let esplora = Esplora::from_config(&config)?;

    let utxos = unspent_with_fallback(&[&blockchain_info, &esplora], &record.btcaddr)
        .await
        .with_context(|| format!("Cannot fetch outputs to finalize; {RECOVERY_HINT}"))?;

    let password = ask_password(cli, false)?;
    if !yes && !confirm_terms()? {
        println!("Aborting. The documents can be found here:");
        println!("  {TERMS_URL}");
        println!("  {AGREEMENT_URL}");
        return Ok(());
    }

    let purchase = presale_wallet::finalize(&record, &utxos, password.as_bytes(), destination, preferred_backend())
        .context("Failed to finalize purchase")?;

    let txid = broadcast_with_fallback(&[&blockchain_info, &esplora], &purchase.tx)
        .await
        .with_context(|| format!("Cannot send transaction; {RECOVERY_HINT}"))?;

    println!("{txid}");
    println!("Balance: {} satoshis", purchase.balance);
    println!("Fee: {} satoshis", purchase.fee);
    if let Some(change) = purchase.change {
        println!("Change: {change} satoshis returned to {}", record.btcaddr);
    }
    println!("Destination: {}", purchase.destination);

    // The purchase is on the network at this point; a failed mail is not fatal.
    let notifier = SaleNotifier::from_config(&config)?;
    if let Err(e) = notifier.notify_purchase(&purchase.tx, &record).await {
        tracing::warn!(error = %e, "sale notification failed");
        eprintln!("Warning: could not notify the sale ({e}). Keep the txid above as your receipt.");
    }
    Ok(())
}

/// Print every purchase credited to a destination address.
async fn list_purchases(cli: &Cli, eth_address: Option<&str>) -> Result<()> {
    let destination = match eth_address {
        Some(addr) => EthAddress::from_hex(addr).context("Invalid destination address")?,
        None => load_record(&cli.wallet)
            .context("Need a destination address or a wallet")?
            .ethaddr,
    };
    let dust_address = FundingAddress::from_eth_address(&destination);

    let config = NetConfig::from_env().context("Invalid network configuration")?;
    let blockchain_info = BlockchainInfo::from_config(&config)?;
    let esplora = Esplora::from_config(&config)?;

    let utxos = unspent_with_fallback(&[&blockchain_info, &esplora], &dust_address)
        .await
        .context("Failed to fetch dust outputs")?;

    for txid in candidate_txids(&utxos) {
        let raw = fetch_with_fallback(&[&blockchain_info, &esplora], &txid)
            .await
            .with_context(|| format!("Failed to fetch transaction {txid}"))?;
        let Some(purchase) = detect_purchase(txid, &raw).with_context(|| format!("Failed to decode {txid}"))?
        else {
            continue;
        };
        let (eth_min, eth_max) = purchase.estimated_eth();
        println!("Tx: {}", purchase.txid);
        println!("Satoshis: {}", purchase.value);
        println!("Estimated ETH (min): {eth_min}");
        println!("Estimated ETH (max): {eth_max}");
    }
    Ok(())
}

fn load_record(path: &Path) -> Result<WalletRecord> {
    WalletRecord::load(path).with_context(|| format!("Failed to load wallet {}", path.display()))
}

fn unlock(cli: &Cli) -> Result<UnlockedWallet> {
    let record = load_record(&cli.wallet)?;
    let password = ask_password(cli, false)?;
    record
        .unlock(password.as_bytes())
        .context("Failed to unlock wallet (check password)")
}

/// Seed as printable text when it is one, otherwise hex.
///
/// `genwallet -s` with the printed text recreates the same wallet for text
/// seeds.
fn seed_text(seed: &Seed) -> Zeroizing<String> {
    match std::str::from_utf8(seed.as_bytes()) {
        Ok(text) if !text.chars().any(char::is_control) => Zeroizing::new(text.to_string()),
        _ => Zeroizing::new(hex::encode(seed.as_bytes())),
    }
}

/// Seed given on the command line. The text itself is the seed.
fn parse_seed(input: &str) -> Result<Seed> {
    Seed::from_bytes(input.as_bytes().to_vec()).context("Invalid seed")
}

/// Fresh random seed stored as its hex text, so `getseed` prints something
/// `genwallet -s` accepts unchanged.
fn generate_seed() -> Result<Seed> {
    let random = Seed::generate();
    Seed::from_bytes(hex::encode(random.as_bytes()).into_bytes()).context("Invalid seed")
}

/// Password from `-p`, otherwise prompted securely (no echo).
fn ask_password(cli: &Cli, twice: bool) -> Result<Zeroizing<String>> {
    if let Some(pw) = &cli.password {
        return Ok(Zeroizing::new(pw.clone()));
    }
    let password = Zeroizing::new(rpassword::prompt_password("Password: ").context("Failed to read password")?);
    if twice {
        let confirm =
            Zeroizing::new(rpassword::prompt_password("Confirm password: ").context("Failed to read password")?);
        if password != confirm {
            bail!("Passwords do not match");
        }
    }
    Ok(password)
}

fn confirm_overwrite(path: &Path, overwrite: bool) -> Result<bool> {
    if overwrite || !path.exists() {
        return Ok(true);
    }
    let answer = prompt_line(&format!("File {} already exists. Overwrite? (y/n) ", path.display()))?;
    Ok(is_yes(&answer))
}

fn confirm_terms() -> Result<bool> {
    let answer = prompt_line(
        "Please confirm that you have read and understand the terms and conditions and purchase agreement (Y/N): ",
    )?;
    Ok(is_yes(&answer))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to write prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
