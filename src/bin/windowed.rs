use std::process;

use strix::gui::System;

fn main() {
    pretty_env_logger::init();

    let (mut event_loop, mut system) = match System::new("windowed") {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("could not start the gui system: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = system.make_window(&event_loop, "strix") {
        eprintln!("could not open a window: {err}");
        process::exit(1);
    }

    let code = system.run(&mut event_loop);
    process::exit(code);
}
