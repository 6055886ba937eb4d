use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use transit_lib::{
    load_timetable, plan_route, plan_tour, Criterion, Itinerary, RenderMode, RouteAlgorithm,
    RouteRequest, TabuConfig, Timestamp, TourRequest,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Timetable routing and round-trip planning")]
struct Cli {
    /// Path to the timetable CSV.
    #[arg(long, global = true, default_value = "connection_graph.csv")]
    timetable: PathBuf,

    /// Emit the plan as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Trace every connection instead of board/alight instructions.
    #[arg(long, global = true)]
    detailed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan the best single route between two stops.
    Route {
        /// Starting stop name.
        #[arg(long = "from")]
        from: String,
        /// Destination stop name.
        #[arg(long = "to")]
        to: String,
        /// Earliest departure time, HH:MM or HH:MM:SS.
        #[arg(long = "at")]
        at: String,
        /// Optimization criterion.
        #[arg(long, value_enum, default_value_t = CriterionArg::Time)]
        criterion: CriterionArg,
        /// Search algorithm.
        #[arg(long, value_enum, default_value_t = AlgorithmArg::AStar)]
        algorithm: AlgorithmArg,
    },
    /// Plan a round trip visiting every listed stop.
    Tour {
        /// Starting (and ending) stop name.
        #[arg(long = "from")]
        from: String,
        /// Semicolon-separated list of stops to visit.
        #[arg(long = "via")]
        via: String,
        /// Earliest departure time, HH:MM or HH:MM:SS.
        #[arg(long = "at")]
        at: String,
        /// Optimization criterion.
        #[arg(long, value_enum, default_value_t = CriterionArg::Time)]
        criterion: CriterionArg,
        /// Seed for the initial waypoint shuffle.
        #[arg(long, default_value_t = 255)]
        seed: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CriterionArg {
    /// Earliest arrival.
    Time,
    /// Fewest line changes.
    Transfers,
}

impl From<CriterionArg> for Criterion {
    fn from(value: CriterionArg) -> Self {
        match value {
            CriterionArg::Time => Criterion::Time,
            CriterionArg::Transfers => Criterion::Transfers,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AlgorithmArg {
    Dijkstra,
    #[value(name = "a-star")]
    AStar,
}

impl From<AlgorithmArg> for RouteAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Dijkstra => RouteAlgorithm::Dijkstra,
            AlgorithmArg::AStar => RouteAlgorithm::AStar,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Route {
            ref from,
            ref to,
            ref at,
            criterion,
            algorithm,
        } => handle_route(&cli, from, to, at, criterion, algorithm),
        Command::Tour {
            ref from,
            ref via,
            ref at,
            criterion,
            seed,
        } => handle_tour(&cli, from, via, at, criterion, seed),
    }
}

fn parse_time(text: &str) -> Result<Timestamp> {
    text.parse()
        .with_context(|| format!("invalid departure time '{text}'"))
}

fn render_mode(cli: &Cli) -> RenderMode {
    if cli.detailed {
        RenderMode::Detailed
    } else {
        RenderMode::Compact
    }
}

fn handle_route(
    cli: &Cli,
    from: &str,
    to: &str,
    at: &str,
    criterion: CriterionArg,
    algorithm: AlgorithmArg,
) -> Result<()> {
    let network = load_timetable(&cli.timetable)
        .with_context(|| format!("failed to load timetable from {}", cli.timetable.display()))?;

    let mut request = RouteRequest::new(from, to, parse_time(at)?);
    request.criterion = criterion.into();
    request.algorithm = algorithm.into();

    let plan = plan_route(&network, &request)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let itinerary = Itinerary::from_legs(&plan.from, &plan.legs);
        print!("{}", itinerary.render(render_mode(cli)));
    }
    eprintln!(
        "cost: {} ({} by {}, labeled {} stops)",
        plan.cost, plan.criterion, plan.algorithm, plan.labeled
    );
    Ok(())
}

fn handle_tour(
    cli: &Cli,
    from: &str,
    via: &str,
    at: &str,
    criterion: CriterionArg,
    seed: u64,
) -> Result<()> {
    let network = load_timetable(&cli.timetable)
        .with_context(|| format!("failed to load timetable from {}", cli.timetable.display()))?;

    let waypoints: Vec<String> = via
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let mut request = TourRequest::new(from, waypoints, parse_time(at)?);
    request.criterion = criterion.into();
    request.tabu = TabuConfig {
        seed,
        ..TabuConfig::default()
    };

    let plan = plan_tour(&network, &request)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("Order: {}", plan.order.join(" -> "));
        let itinerary = Itinerary::from_legs(&plan.order[0], &plan.legs);
        print!("{}", itinerary.render(render_mode(cli)));
    }
    eprintln!("cost: {} ({})", plan.cost, plan.criterion);
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
