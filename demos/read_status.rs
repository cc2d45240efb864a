use pt_label::{Config, Printer};
use std::time::Duration;

//
// cargo run --example read_status [/dev/usb/lp0]
//

fn main() {
    env_logger::init();

    let device = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/usb/lp0".to_string());

    let mut printer = match Printer::open(Config::new(device)) {
        Ok(printer) => printer,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    let reader = printer.start_status_reader().expect("status reader");

    printer.invalidate().unwrap();
    printer.initialize().unwrap();
    printer.request_status().unwrap();

    if printer.wait_for_status(Duration::from_secs(3)) {
        printer.show_info();
    } else {
        eprintln!("no status frame received from the printer");
    }

    printer.close();
    reader.join().unwrap();
}
