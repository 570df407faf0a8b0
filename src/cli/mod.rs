use crate::{
    assemble_prompt, server, ConstraintViolation, PlanningContext, RulesEngine, Settings,
    TripRequest, VegaPipeline,
};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::{
    io::Read,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tracing::info;

/// CLI entry point for the vega tool
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = command().get_matches();

    match matches.subcommand() {
        Some(("serve", args)) => serve(args).await,
        Some(("suggest", args)) => suggest(args).await,
        Some(("prompt", args)) => prompt(args),
        _ => unreachable!("subcommand is required"),
    }
}

fn command() -> Command {
    let request_arg = Arg::new("request")
        .help("Path to a trip request JSON file, or - for stdin")
        .required(true)
        .index(1);

    Command::new("vega")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Activity suggestions for one time slot of a trip")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP service")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("Address to bind (or set VEGA_HOST)")
                        .value_parser(value_parser!(IpAddr)),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Port to listen on (or set PORT)")
                        .value_parser(value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("suggest")
                .about("Run the pipeline once and print the response")
                .arg(request_arg.clone()),
        )
        .subcommand(
            Command::new("prompt")
                .about("Print the prompt a request would send, without calling a backend")
                .arg(request_arg),
        )
}

async fn serve(args: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let bind = SocketAddr::new(
        args.get_one::<IpAddr>("host")
            .copied()
            .unwrap_or_else(|| settings.bind.ip()),
        args.get_one::<u16>("port")
            .copied()
            .unwrap_or_else(|| settings.bind.port()),
    );

    info!(
        backend = ?settings.backend,
        model = %settings.model,
        endpoint = %settings.endpoint,
        "starting vega"
    );
    let pipeline = Arc::new(
        VegaPipeline::new(settings.build_gateway()?).with_timeout(settings.timeout),
    );

    server::serve(pipeline, &settings.allowed_origins, bind).await?;
    Ok(())
}

async fn suggest(args: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let request = read_request(args)?;
    let settings = Settings::from_env()?;
    let pipeline = VegaPipeline::new(settings.build_gateway()?).with_timeout(settings.timeout);

    let response = pipeline.suggest(&request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn prompt(args: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let request = read_request(args)?;

    match render_prompt(&request) {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(violation) => {
            eprintln!("{violation}");
            std::process::exit(1);
        }
    }
}

/// Normalize, apply the default rules and assemble, without calling a backend.
fn render_prompt(request: &TripRequest) -> Result<String, ConstraintViolation> {
    let context = PlanningContext::from_request(request);
    let constrained = RulesEngine::default().apply(&context)?;
    Ok(assemble_prompt(&constrained).combined())
}

fn read_request(args: &ArgMatches) -> Result<TripRequest, Box<dyn std::error::Error>> {
    let source = args
        .get_one::<String>("request")
        .map(String::as_str)
        .unwrap_or("-");

    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)
            .map_err(|err| format!("failed to read request file {source}: {err}"))?
    };

    let deserializer = &mut serde_json::Deserializer::from_str(&raw);
    let request: TripRequest = serde_path_to_error::deserialize(deserializer)
        .map_err(|err| format!("invalid trip request at {}: {}", err.path(), err.inner()))?;
    Ok(request)
}
