use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use rand::{rngs::StdRng, SeedableRng};
use std::{error::Error, time::Instant};
use tempograph::{
    batch::{generate_actions, random_batches},
    snapshot::{read_action_stream, read_graph_snapshot, write_action_stream},
    Batch, BatchSession, CsrFields, GraphConfig,
};

fn parse<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Box<dyn Error>>
where
    T::Err: std::fmt::Display,
{
    let value = matches.value_of(name).ok_or_else(|| format!("missing {}", name))?;
    value
        .parse()
        .map_err(|e| format!("invalid {} {:?}: {}", name, value, e).into())
}

fn seeded_rng(matches: &ArgMatches) -> Result<StdRng, Box<dyn Error>> {
    Ok(match matches.value_of("seed") {
        Some(_) => StdRng::seed_from_u64(parse(matches, "seed")?),
        None => StdRng::from_entropy(),
    })
}

fn handle_replay(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let batch_size: usize = parse(matches, "batch-size")?;
    let time_now = Instant::now();
    let csr = read_graph_snapshot(matches.value_of("GRAPH").ok_or("missing GRAPH")?)?;
    eprintln!("time_graphread: {}", time_now.elapsed().as_millis());
    let time_now = Instant::now();
    let batches = match matches.value_of("ACTIONS") {
        Some(path) => {
            let actions = read_action_stream(path)?;
            let num_batches = match matches.value_of("num-batches") {
                Some(_) => parse(matches, "num-batches")?,
                None => (actions.len() + batch_size.max(1) - 1) / batch_size.max(1),
            };
            let mut chunks = actions.chunks(batch_size.max(1)).take(num_batches).peekable();
            let mut batches = vec![];
            while let Some(chunk) = chunks.next() {
                batches.push(Batch::new(chunk.to_vec()).keep_alive(chunks.peek().is_some()));
            }
            batches
        }
        None => {
            let num_batches: usize =
                parse(matches, "num-batches").map_err(|_| "--num-batches is required without ACTIONS")?;
            random_batches(csr.num_vertices(), batch_size, num_batches, &mut seeded_rng(matches)?)
        }
    };
    eprintln!("time_actionread: {}", time_now.elapsed().as_millis());
    eprintln!("nv: {}", csr.num_vertices());
    eprintln!("ne: {}", csr.num_edges());
    eprintln!("batchsize: {}", batch_size);
    eprintln!("nbatch: {}", batches.len());
    eprintln!("naction: {}", batches.iter().map(|b| b.actions.len()).sum::<usize>());

    let config = GraphConfig::new(csr.num_vertices()).num_etypes(1);
    let graph = csr.to_graph(config, 0, 0)?;
    let time_now = Instant::now();
    let mut session = BatchSession::new(&graph);
    for batch in batches.iter() {
        session.receive(batch)?;
    }
    eprintln!("time_updates: {}", time_now.elapsed().as_millis());
    eprintln!("{}", session.totals());

    let time_now = Instant::now();
    let fields = CsrFields::weights();
    let csr = if matches.is_present("sorted") {
        graph.to_sorted_csr(fields)?
    } else {
        graph.to_unsorted_csr(fields)?
    };
    eprintln!("time_csr: {}", time_now.elapsed().as_millis());
    println!("{}", graph.stats());
    println!("csr edges: {}", csr.num_edges());
    Ok(())
}

fn handle_generate(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let num_vertices: usize = parse(matches, "num-vertices")?;
    let num_actions: usize = parse(matches, "num-actions")?;
    let delete_ratio: f64 = parse(matches, "delete-ratio")?;
    let actions = generate_actions(num_vertices, num_actions, delete_ratio, &mut seeded_rng(matches)?);
    write_action_stream(matches.value_of("OUT").ok_or("missing OUT")?, &actions)?;
    eprintln!("naction: {}", actions.len());
    Ok(())
}

fn handle_stats(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let csr = read_graph_snapshot(matches.value_of("GRAPH").ok_or("missing GRAPH")?)?;
    let graph = csr.to_graph(GraphConfig::new(csr.num_vertices()).num_etypes(1), 0, 0)?;
    println!("{}", graph.stats());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new("tempograph")
        .about("In-memory temporal multigraph store")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .takes_value(true)
                .global(true)
                .help("Worker threads [default: all cores]"),
        )
        .subcommand(
            SubCommand::with_name("replay")
                .about("Applies an action stream to a graph snapshot in batches")
                .arg(Arg::with_name("GRAPH").required(true))
                .arg(
                    Arg::with_name("ACTIONS")
                        .help("Action stream [default: random insertion batches]"),
                )
                .arg(
                    Arg::with_name("batch-size")
                        .long("batch-size")
                        .takes_value(true)
                        .default_value("100000"),
                )
                .arg(
                    Arg::with_name("num-batches")
                        .long("num-batches")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("sorted")
                        .long("sorted")
                        .help("Extract a CSR with sorted rows"),
                )
                .arg(Arg::with_name("seed").long("seed").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("Writes a random action stream")
                .arg(Arg::with_name("OUT").required(true))
                .arg(
                    Arg::with_name("num-vertices")
                        .long("num-vertices")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("num-actions")
                        .long("num-actions")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("delete-ratio")
                        .long("delete-ratio")
                        .takes_value(true)
                        .default_value("0"),
                )
                .arg(Arg::with_name("seed").long("seed").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("stats")
                .about("Loads a graph snapshot and prints its statistics")
                .arg(Arg::with_name("GRAPH").required(true)),
        )
        .get_matches();
    if matches.value_of("threads").is_some() {
        let threads: usize = parse(&matches, "threads")?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }
    if let Some(matches) = matches.subcommand_matches("replay") {
        handle_replay(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("generate") {
        handle_generate(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("stats") {
        handle_stats(matches)?;
    }
    Ok(())
}
