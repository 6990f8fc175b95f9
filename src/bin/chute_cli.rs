#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("chute_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::Path;

    use chute_engine::engine::{self, FrameReport, Resize, ResizeOutcome};
    use chute_engine::parse::config_xml::{self, ConfigSet};
    use chute_engine::parse::craft_xml::{self, Craft};
    use chute_engine::parse::persist_xml;

    const USAGE: &str = r"chute_cli (chute-engine)

USAGE:
  chute_cli list <config.xml>
  chute_cli resize <config.xml> <craft.xml> <part> <index> [options]

OPTIONS (resize):
  --save         Print the persisted state of the resized part
  --frame        Resize through the frame update instead of a direct call
  -h, --help     Show this help
";

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => cmd_list(&mut args),
            "resize" => cmd_resize(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn cmd_list(args: &mut Args) -> Result<(), String> {
        let config = load_config(&args.value("<config.xml>")?)?;

        for archetype in config.sizes.archetypes() {
            let sizes = config
                .sizes
                .sizes(archetype)
                .iter()
                .map(|record| record.size_id.as_str())
                .collect::<Vec<_>>();
            println!("{archetype}: {}", sizes.join(", "));
        }
        for preset in config.presets.iter() {
            println!(
                "preset `{}` ({}, {} chutes)",
                preset.name,
                preset.size_id,
                preset.chutes.len()
            );
        }
        Ok(())
    }

    fn cmd_resize(args: &mut Args) -> Result<(), String> {
        let config = load_config(&args.value("<config.xml>")?)?;
        let craft_path = args.value("<craft.xml>")?;
        let label = args.value("<part>")?;
        let index: usize = args
            .value("<index>")?
            .parse()
            .map_err(|err| format!("invalid size index: {err}"))?;

        let mut save = false;
        let mut frame = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--save" => save = true,
                "--frame" => frame = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`")),
            }
        }

        let mut craft = load_craft(&craft_path, &config)?;
        let id = craft
            .id(&label)
            .ok_or_else(|| format!("part `{label}` not found in `{craft_path}`"))?;

        if frame {
            if let Some(chute) = craft
                .assembly
                .part_mut(id)
                .and_then(|part| part.procedural.as_mut())
            {
                chute.size = index;
            }
            let report = engine::update(&mut craft.assembly, &config.sizes);
            print_frame(&craft, &report);
        } else {
            let outcome = engine::PropagationEngine::new(&config.sizes)
                .apply_resize(&mut craft.assembly, id, index)
                .map_err(|err| err.to_string())?;
            print_outcome(&craft, &outcome);
        }

        print_positions(&craft);

        if save {
            let chute = craft
                .assembly
                .part(id)
                .and_then(|part| part.procedural.as_ref())
                .ok_or_else(|| format!("part `{label}` has no procedural chute"))?;
            println!("{}", persist_xml::to_xml(chute).map_err(|err| err.to_string())?);
        }
        Ok(())
    }

    fn load_config(path: &str) -> Result<ConfigSet, String> {
        let text = read(path)?;
        config_xml::parse_str(&text).map_err(|err| format!("{path}: {err}"))
    }

    fn load_craft(path: &str, config: &ConfigSet) -> Result<Craft, String> {
        let text = read(path)?;
        let mut craft = craft_xml::parse_str(&text).map_err(|err| format!("{path}: {err}"))?;
        let fresh = engine::initialize_all(&mut craft.assembly, &config.bodies, &config.cases);
        eprintln!(
            "loaded `{}`: {} parts, {} initialized",
            craft.name,
            craft.assembly.part_count(),
            fresh.len()
        );
        Ok(craft)
    }

    fn read(path: &str) -> Result<String, String> {
        fs::read_to_string(Path::new(path)).map_err(|err| format!("cannot read {path}: {err}"))
    }

    fn print_outcome(craft: &Craft, outcome: &ResizeOutcome) {
        match outcome {
            ResizeOutcome::Applied(report) => {
                println!(
                    "resized {} from {} to {} as {:?}",
                    craft.label(report.part).unwrap_or("?"),
                    report.from,
                    report.to,
                    report.role
                );
                for stale in &report.stale {
                    println!("  stale {} reference {} -> {}", stale.link, stale.holder, stale.target);
                }
            }
            ResizeOutcome::Unchanged => println!("size already applied"),
            ResizeOutcome::Ignored(reason) => println!("ignored: {reason:?}"),
        }
    }

    fn print_frame(craft: &Craft, report: &FrameReport) {
        for (id, outcome) in &report.resized {
            if outcome.report().is_some() {
                println!("frame resized {}", craft.label(*id).unwrap_or("?"));
            }
        }
        for (id, err) in &report.errors {
            println!("frame error on {}: {err}", craft.label(*id).unwrap_or("?"));
        }
    }

    fn print_positions(craft: &Craft) {
        for (label, id) in craft.labels() {
            if let Some(part) = craft.assembly.part(id) {
                println!(
                    "{label:<16} {:<16} position ({}) scale ({})",
                    part.name, part.position, part.model_scale
                );
            }
        }
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, name: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing {name}\n\n{USAGE}"))
        }
    }
}
