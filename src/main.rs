use anyhow::{bail, Context};
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, info, LevelFilter};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rsa_blocks::keygen::{DEFAULT_BITS, DEFAULT_ITERS};
use rsa_blocks::util::describe;
use rsa_blocks::{
    decrypt_file, encrypt_file, generate_keypair, identity_to_int, sign, KeygenParams, PrivateKey,
    PublicKey, RandState,
};

fn cli() -> Command {
    let input = Arg::new("input")
        .long("input")
        .short('i')
        .action(ArgAction::Set)
        .value_parser(value_parser!(PathBuf))
        .help("input file (default: stdin)");
    let output = Arg::new("output")
        .long("output")
        .short('o')
        .action(ArgAction::Set)
        .value_parser(value_parser!(PathBuf))
        .help("output file (default: stdout)");

    Command::new("rsa-blocks")
        .version(crate_version!())
        .about("textbook RSA key generation, encryption and decryption")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("print key material and progress"),
        )
        .subcommand(
            Command::new("keygen")
                .about("generate an RSA public/private key pair")
                .arg(
                    Arg::new("bits")
                        .long("bits")
                        .short('b')
                        .action(ArgAction::Set)
                        .default_value(DEFAULT_BITS.to_string())
                        .value_parser(value_parser!(u64))
                        .help("minimum bits of the public modulus n"),
                )
                .arg(
                    Arg::new("iters")
                        .long("iters")
                        .short('i')
                        .action(ArgAction::Set)
                        .default_value(DEFAULT_ITERS.to_string())
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Miller-Rabin iterations for testing primes"),
                )
                .arg(
                    Arg::new("pubkey")
                        .long("pubkey")
                        .short('n')
                        .action(ArgAction::Set)
                        .default_value("rsa.pub")
                        .value_parser(value_parser!(PathBuf))
                        .help("public key file"),
                )
                .arg(
                    Arg::new("privkey")
                        .long("privkey")
                        .short('d')
                        .action(ArgAction::Set)
                        .default_value("rsa.priv")
                        .value_parser(value_parser!(PathBuf))
                        .help("private key file, created owner read/write only"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .short('s')
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(u64))
                        .help("random seed for reproducible keys"),
                )
                .arg(
                    Arg::new("max-attempts")
                        .long("max-attempts")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(u64))
                        .help("give up after this many prime candidates"),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .short('u')
                        .action(ArgAction::Set)
                        .help("identity to sign (default: $USER)"),
                ),
        )
        .subcommand(
            Command::new("encrypt")
                .about("encrypt data with a public key")
                .arg(input.clone())
                .arg(output.clone())
                .arg(
                    Arg::new("pubkey")
                        .long("pubkey")
                        .short('n')
                        .action(ArgAction::Set)
                        .default_value("rsa.pub")
                        .value_parser(value_parser!(PathBuf))
                        .help("public key file"),
                ),
        )
        .subcommand(
            Command::new("decrypt")
                .about("decrypt data produced by `encrypt`")
                .arg(input)
                .arg(output)
                .arg(
                    Arg::new("privkey")
                        .long("privkey")
                        .short('n')
                        .action(ArgAction::Set)
                        .default_value("rsa.priv")
                        .value_parser(value_parser!(PathBuf))
                        .help("private key file"),
                ),
        )
}

fn main() -> anyhow::Result<()> {
    let app = cli().get_matches();

    let level = if app.get_flag("verbose") {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    match app.subcommand() {
        Some(("keygen", m)) => keygen(m),
        Some(("encrypt", m)) => encrypt(m),
        Some(("decrypt", m)) => decrypt(m),
        Some((name, _)) => bail!("unsupported command `{name}`"),
        None => unreachable!("a subcommand is required"),
    }
}

fn keygen(m: &ArgMatches) -> anyhow::Result<()> {
    let params = KeygenParams {
        bits: *m.get_one::<u64>("bits").unwrap_or(&DEFAULT_BITS),
        iters: *m.get_one::<u64>("iters").unwrap_or(&DEFAULT_ITERS),
        max_prime_attempts: m.get_one::<u64>("max-attempts").copied(),
    };
    let username = match m.get_one::<String>("user") {
        Some(user) => user.clone(),
        None => std::env::var("USER").context("USER is not set, pass --user")?,
    };
    let identity = identity_to_int(&username)?;

    let pub_path = path_arg(m, "pubkey")?;
    let priv_path = path_arg(m, "privkey")?;
    let mut pub_file = BufWriter::new(
        File::create(pub_path)
            .with_context(|| format!("unable to open public key file {}", pub_path.display()))?,
    );
    let mut priv_file = BufWriter::new(
        create_private(priv_path)
            .with_context(|| format!("unable to open private key file {}", priv_path.display()))?,
    );

    let mut rng = match m.get_one::<u64>("seed") {
        Some(&seed) => RandState::new(seed),
        None => RandState::from_entropy(),
    };
    debug!("seed = {}", rng.seed());

    let key = generate_keypair(&params, &mut rng)?;
    let s = sign(&identity, &key.d, &key.n)?;

    let public = PublicKey {
        n: key.n.clone(),
        e: key.e.clone(),
        s,
        username,
    };
    let private = PrivateKey {
        n: key.n.clone(),
        d: key.d.clone(),
    };
    public.write(&mut pub_file)?;
    private.write(&mut priv_file)?;

    info!("user = {}", public.username);
    info!("{}", describe("s", &public.s));
    info!("{}", describe("p", &key.p));
    info!("{}", describe("q", &key.q));
    info!("{}", describe("n", &key.n));
    info!("{}", describe("e", &key.e));
    info!("{}", describe("d", &key.d));
    info!("fingerprint = {}", public.fingerprint());

    Ok(())
}

fn encrypt(m: &ArgMatches) -> anyhow::Result<()> {
    let pub_path = path_arg(m, "pubkey")?;
    let key = PublicKey::read(
        &mut File::open(pub_path)
            .with_context(|| format!("unable to open public key file {}", pub_path.display()))?,
    )?;

    info!("user = {}", key.username);
    info!("{}", describe("s", &key.s));
    info!("{}", describe("n", &key.n));
    info!("{}", describe("e", &key.e));
    info!("fingerprint = {}", key.fingerprint());

    if !key.verify()? {
        bail!("could not verify signature of {}", key.username);
    }

    let mut input = open_input(m)?;
    let mut output = open_output(m)?;
    encrypt_file(&mut input, &mut output, &key.n, &key.e)?;

    Ok(())
}

fn decrypt(m: &ArgMatches) -> anyhow::Result<()> {
    let priv_path = path_arg(m, "privkey")?;
    let key = PrivateKey::read(
        &mut File::open(priv_path)
            .with_context(|| format!("unable to open private key file {}", priv_path.display()))?,
    )?;

    info!("{}", describe("n", &key.n));
    info!("{}", describe("d", &key.d));

    let mut input = open_input(m)?;
    let mut output = open_output(m)?;
    decrypt_file(&mut input, &mut output, &key.n, &key.d)?;

    Ok(())
}

fn path_arg<'a>(m: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    m.get_one::<PathBuf>(name)
        .with_context(|| format!("missing `{name}`"))
}

fn open_input(m: &ArgMatches) -> anyhow::Result<Box<dyn BufRead>> {
    match m.get_one::<PathBuf>("input") {
        Some(p) => {
            let f = File::open(p).with_context(|| format!("unable to open {}", p.display()))?;
            Ok(Box::new(BufReader::new(f)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(m: &ArgMatches) -> anyhow::Result<Box<dyn Write>> {
    match m.get_one::<PathBuf>("output") {
        Some(p) => {
            let f = File::create(p).with_context(|| format!("unable to open {}", p.display()))?;
            Ok(Box::new(BufWriter::new(f)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Opens `path` for writing with owner-only read/write permissions.
fn create_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options.open(path)?;
    // an existing file keeps its old mode through `open`
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}
