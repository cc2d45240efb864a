use pt_label::{pack_line, CommandMode, Config, Printer, LINE_PIXELS};
use std::time::Duration;

//
// cargo run --example print_image <image-file> [/dev/usb/lp0] [--simulate]
//
// The image is thresholded to black and white; each image row becomes one
// raster line, so the image should already be rotated for the tape and be
// no wider than the printable width of the installed media.
//

const THRESHOLD: u8 = 128;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let image_path = match args.get(1) {
        Some(path) => path.clone(),
        None => {
            eprintln!("usage: print_image <image-file> [device] [--simulate]");
            std::process::exit(2);
        }
    };
    let device = args
        .get(2)
        .filter(|arg| !arg.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "/dev/usb/lp0".to_string());
    let simulate = args.iter().any(|arg| arg == "--simulate");

    let gray = match image::open(&image_path) {
        Ok(img) => img.to_luma8(),
        Err(err) => {
            eprintln!("cannot load {}: {}", image_path, err);
            std::process::exit(1);
        }
    };
    let (width, height) = gray.dimensions();

    let config = Config::new(device).simulate(simulate);
    let mut printer = match Printer::open(config) {
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
    if !printer.wait_for_status(Duration::from_secs(3)) && !simulate {
        eprintln!("printer did not report status");
        std::process::exit(1);
    }
    printer.show_info();

    let max_width = printer.max_printing_width() as u32;
    if width > max_width {
        eprintln!("image is {} px wide, media allows {}", width, max_width);
        std::process::exit(1);
    }
    // center the image across the print head
    let margin = (LINE_PIXELS as u32 - width) / 2;

    let (media_type, media_width) = match printer.status() {
        Some(frame) => (frame.media_type, frame.media_width),
        None => (0, 0),
    };

    printer.switch_mode(CommandMode::Raster).unwrap();
    printer
        .set_print_information(media_type, media_width, true, height)
        .unwrap();
    printer.set_cut_mirror(true, false).unwrap();
    printer.set_advanced_mode(true, false, false).unwrap();
    printer.set_feed_margins(14).unwrap();
    if printer.model().map_or(false, |m| m.compression) {
        printer.set_compression().unwrap();
    }

    for y in 0..height {
        let mut pixels = vec![false; LINE_PIXELS];
        for x in 0..width {
            let dark = gray.get_pixel(x, y)[0] < THRESHOLD;
            pixels[(margin + x) as usize] = dark;
        }
        printer.send_raster_line(&pack_line(&pixels)).unwrap();
    }

    printer.print_and_feed().unwrap();
    if printer.wait_for_print_completed(Duration::from_secs(30)) {
        println!("printing completed");
    } else {
        eprintln!("timed out waiting for the print to complete");
    }

    printer.close();
    reader.join().unwrap();
}
