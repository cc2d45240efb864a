//! Printer driver: device handle, command encoder and the background
//! status reader.
//!
//! Two activities run concurrently. The foreground owns the device for
//! writes and issues command sequences; a background thread polls the
//! device for 32-byte status frames and publishes the decoded result
//! through shared state. Every status-dependent command follows the
//! clear-then-send pattern, so a wait after a request is guaranteed to
//! observe a frame produced after the request.

use log::{debug, info, trace, warn};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::media::{max_pixel_for_media, MEDIA_TYPE_NO_TAPE};
use crate::model::ModelInfo;
use crate::raster::line_to_ascii;
use crate::status::{
    StatusFrame, FRAME_LEN, PHASE_PRINTING, STATUS_PHASE_CHANGE, STATUS_PRINTING_COMPLETED,
};
use crate::{LINE_BYTES, LINE_PIXELS};

/// Poll cadence shared by the reader loop and the wait primitives.
const LOOP_DELAY: Duration = Duration::from_millis(100);

/// Back-off after a frame that fails signature validation. Long enough to
/// keep a desynchronized stream from flooding the log.
const DESYNC_DELAY: Duration = Duration::from_secs(10);

// Print information validity bits.
const PI_KIND: u8 = 0x02;
const PI_WIDTH: u8 = 0x04;
const PI_RECOVER: u8 = 0x80;

/// Dynamic command mode selected with `ESC i a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    EscP,
    Raster,
    Template,
}

impl CommandMode {
    fn code(self) -> u8 {
        match self {
            Self::EscP => 0x00,
            Self::Raster => 0x01,
            Self::Template => 0x03,
        }
    }
}

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    device: PathBuf,
    simulate: bool,
}

impl Config {
    pub fn new(device: impl Into<PathBuf>) -> Config {
        Config {
            device: device.into(),
            simulate: false,
        }
    }

    /// Suppress all device writes and synthesize print completion.
    ///
    /// With simulate enabled an unopenable device path is downgraded from a
    /// fatal error to a warning.
    pub fn simulate(self, flag: bool) -> Self {
        Config {
            simulate: flag,
            ..self
        }
    }
}

/// State written by the background reader and read by the foreground.
struct Shared {
    active: AtomicBool,
    /// Edge-triggered: set on every adopted frame, cleared by
    /// clear-then-send commands.
    status_updated: AtomicBool,
    is_printing: AtomicBool,
    latched: Mutex<Latched>,
}

struct Latched {
    frame: Option<StatusFrame>,
    status_code: u8,
    /// `None` until the first valid frame resolves the model; the
    /// resolution happens exactly once per session.
    model: Option<ModelInfo>,
    max_printing_width: u16,
}

impl Shared {
    fn new() -> Shared {
        Shared {
            active: AtomicBool::new(true),
            status_updated: AtomicBool::new(false),
            is_printing: AtomicBool::new(false),
            latched: Mutex::new(Latched {
                frame: None,
                status_code: 0,
                model: None,
                max_printing_width: LINE_PIXELS as u16,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Latched> {
        // Writers never panic while holding the lock; recover anyway.
        self.latched.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Adopt one validated frame.
    ///
    /// The first frame latches model capabilities and the printable width;
    /// later frames must not recompute them, tape state does not change
    /// within a job. The frame is stored before the updated flag is set so
    /// a woken waiter always sees the data it was signaled for.
    fn adopt_frame(&self, frame: StatusFrame) {
        let mut latched = self.lock();

        if latched.model.is_none() {
            let model = ModelInfo::from_code(frame.model_code);
            let media_cap = max_pixel_for_media(frame.media_width, model.resolution);
            latched.max_printing_width = if media_cap == 0 {
                model.pixel_width
            } else {
                media_cap.min(model.pixel_width)
            };
            info!(
                "resolved printer model ({:#04x}) {}, max printing width {} px",
                frame.model_code, model.name, latched.max_printing_width
            );
            latched.model = Some(model);
        }

        latched.status_code = frame.status_code;
        if frame.status_code == STATUS_PHASE_CHANGE {
            self.is_printing
                .store(frame.phase_type == PHASE_PRINTING, Ordering::SeqCst);
        }
        latched.frame = Some(frame);
        drop(latched);

        self.status_updated.store(true, Ordering::SeqCst);
    }
}

/// Driver for one P-touch printer on a raw character device.
///
/// The caller constructs and owns exactly one instance per device; there is
/// no registry or singleton.
pub struct Printer {
    device: Option<File>,
    shared: Arc<Shared>,
    config: Config,
}

impl Printer {
    /// Open the printer character device read/write.
    ///
    /// The device is opened non-blocking so the status reader can poll
    /// instead of parking in the kernel past shutdown.
    pub fn open(config: Config) -> Result<Printer, Error> {
        info!("using printer device {}", config.device.display());

        let device = match OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&config.device)
        {
            Ok(file) => Some(file),
            Err(source) => {
                if config.simulate {
                    warn!(
                        "cannot open {} ({}), continuing without a device",
                        config.device.display(),
                        source
                    );
                    None
                } else {
                    return Err(Error::Open {
                        path: config.device.clone(),
                        source,
                    });
                }
            }
        };

        Ok(Printer {
            device,
            shared: Arc::new(Shared::new()),
            config,
        })
    }

    /// Start the background status reader.
    ///
    /// Runs until [`Printer::close`] clears the active flag. The thread
    /// never terminates on a bad frame; it warns and backs off.
    pub fn start_status_reader(&self) -> Result<thread::JoinHandle<()>, Error> {
        let device = match &self.device {
            Some(file) => Some(file.try_clone().map_err(Error::Reader)?),
            None => None,
        };
        let shared = Arc::clone(&self.shared);

        thread::Builder::new()
            .name("ptouch-status".to_string())
            .spawn(move || read_status_loop(device, shared))
            .map_err(Error::Reader)
    }

    /// Write one command to the device as a single atomic operation.
    ///
    /// A no-op in simulate mode. Write failures are not retried here.
    pub fn send_command(&mut self, command: &[u8]) -> Result<(), Error> {
        trace!("tx {:02X?}", command);

        if self.config.simulate {
            return Ok(());
        }
        if let Some(device) = self.device.as_mut() {
            device.write_all(command).map_err(Error::Write)?;
        }
        Ok(())
    }

    /// Flush any partial command state in the printer with 100 zero bytes.
    /// Required before every session.
    pub fn invalidate(&mut self) -> Result<(), Error> {
        self.send_command(&[0x00; 100])
    }

    /// `ESC @` protocol reset.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.send_command(&[0x1B, 0x40])
    }

    /// Clear the updated flag, then ask for a status frame, so a following
    /// wait observes a fresh reply rather than a stale one.
    pub fn request_status(&mut self) -> Result<(), Error> {
        self.reset_status();
        self.send_command(&[0x1B, 0x69, 0x53])
    }

    /// `ESC i a`: switch the dynamic command mode.
    pub fn switch_mode(&mut self, mode: CommandMode) -> Result<(), Error> {
        self.send_command(&[0x1B, 0x69, 0x61, mode.code()])
    }

    /// `ESC i z`: print information for the upcoming page.
    ///
    /// `raster_count` is the number of raster lines that will follow.
    pub fn set_print_information(
        &mut self,
        media_type: u8,
        media_width: u8,
        is_starting_page: bool,
        raster_count: u32,
    ) -> Result<(), Error> {
        let command =
            print_information_command(media_type, media_width, is_starting_page, raster_count);
        self.send_command(&command)
    }

    /// `ESC i M`: auto cut at page start and mirror printing.
    pub fn set_cut_mirror(&mut self, cut: bool, mirror: bool) -> Result<(), Error> {
        self.send_command(&cut_mirror_command(cut, mirror))
    }

    /// `ESC i K`: chain printing, special tape and buffer clearing flags.
    pub fn set_advanced_mode(
        &mut self,
        no_chain_printing: bool,
        special_tape: bool,
        no_buffer_clearing: bool,
    ) -> Result<(), Error> {
        let command = advanced_mode_command(no_chain_printing, special_tape, no_buffer_clearing);
        self.send_command(&command)
    }

    /// `ESC i d`: feed margin in dots.
    pub fn set_feed_margins(&mut self, margin_dots: u16) -> Result<(), Error> {
        self.send_command(&feed_margins_command(margin_dots))
    }

    /// `M 02`: select compressed raster mode.
    pub fn set_compression(&mut self) -> Result<(), Error> {
        self.send_command(&[0x4D, 0x02])
    }

    /// `Z`: one empty raster line without payload.
    pub fn send_zero_raster(&mut self) -> Result<(), Error> {
        self.send_command(&[0x5A])
    }

    /// Send one packed raster line, framed per the latched model's
    /// compression capability.
    pub fn send_raster_line(&mut self, line: &[u8; LINE_BYTES]) -> Result<(), Error> {
        debug!("raster |{}|", line_to_ascii(line));

        let compression = self.shared.lock().model.map_or(false, |m| m.compression);
        self.send_command(&raster_command(line, compression))
    }

    /// `FF`: print the page, keep the job open for a chained page.
    pub fn print(&mut self) -> Result<(), Error> {
        self.reset_status();
        self.send_command(&[0x0C])?;
        if self.config.simulate {
            self.force_completed();
        }
        Ok(())
    }

    /// `SUB`: print the last page and feed the tape out.
    pub fn print_and_feed(&mut self) -> Result<(), Error> {
        self.reset_status();
        self.send_command(&[0x1A])?;
        if self.config.simulate {
            self.force_completed();
        }
        Ok(())
    }

    /// Clear the edge-triggered "new status available" flag.
    pub fn reset_status(&self) {
        self.shared.status_updated.store(false, Ordering::SeqCst);
    }

    // No frames ever arrive in simulate mode; synthesize the outcome the
    // wait primitives expect.
    fn force_completed(&self) {
        self.shared.lock().status_code = STATUS_PRINTING_COMPLETED;
        self.shared.is_printing.store(false, Ordering::SeqCst);
        self.shared.status_updated.store(true, Ordering::SeqCst);
    }

    /// Block until a new status frame has been adopted, the timeout
    /// elapses, or the driver shuts down. Returns whether one arrived.
    pub fn wait_for_status(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, || {
            self.shared.status_updated.load(Ordering::SeqCst)
        })
    }

    /// Block until the most recent frame shows the print phase has ended.
    pub fn wait_for_print_completed(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, || {
            self.shared.status_updated.load(Ordering::SeqCst)
                && !self.shared.is_printing.load(Ordering::SeqCst)
        })
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while self.shared.active.load(Ordering::SeqCst) && start.elapsed() < timeout {
            if done() {
                return true;
            }
            thread::sleep(LOOP_DELAY);
        }
        false
    }

    /// Latest adopted status frame, if any arrived yet.
    pub fn status(&self) -> Option<StatusFrame> {
        self.shared.lock().frame
    }

    pub fn status_code(&self) -> u8 {
        self.shared.lock().status_code
    }

    /// Model resolved from the first valid frame.
    pub fn model(&self) -> Option<ModelInfo> {
        self.shared.lock().model
    }

    /// Printable width latched from the first valid frame: the model's
    /// native width, capped by the installed tape where the cap is known.
    pub fn max_printing_width(&self) -> u16 {
        self.shared.lock().max_printing_width
    }

    pub fn is_printing(&self) -> bool {
        self.shared.is_printing.load(Ordering::SeqCst)
    }

    /// Log a human-readable summary of printer, media and print geometry.
    pub fn show_info(&self) {
        let latched = self.shared.lock();
        let frame = match latched.frame {
            Some(frame) => frame,
            None => {
                info!("no status received from the printer yet");
                return;
            }
        };
        let model = latched
            .model
            .unwrap_or_else(|| ModelInfo::from_code(frame.model_code));

        if frame.error_code > 0 {
            warn!(
                "printer error ({:#06x}): {}",
                frame.error_code,
                frame.error_description()
            );
        }
        info!("model ........: ({:#04x}) {}", frame.model_code, model.name);
        info!("pixel width ..: {} px", model.pixel_width);
        info!("resolution ...: {} dpi", model.resolution);
        info!(
            "media type ...: ({}) {}",
            frame.media_type,
            frame.media_type_description()
        );
        info!("media width ..: {} mm", frame.media_width);
        info!("media length .: {} mm", frame.media_length);
        info!(
            "media color ..: {}, text: {}",
            frame.tape_color_description(),
            frame.text_color_description()
        );
        info!("max width ....: {} px", latched.max_printing_width);
    }

    /// Shut the driver down: stop the reader, release the device.
    ///
    /// Safe to call repeatedly and without a successful open. Waiters
    /// unblock on the next poll tick.
    pub fn close(&mut self) {
        self.shared.active.store(false, Ordering::SeqCst);
        self.device = None;
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Body of the reader thread.
///
/// Polls the device at the loop cadence, accumulates partial reads into a
/// full frame, discards frames that fail validation (with a long back-off,
/// the stream is desynchronized) and adopts the rest. Designed to run
/// unattended: nothing in here panics or exits early.
fn read_status_loop(mut device: Option<File>, shared: Arc<Shared>) {
    debug!("status reader started");
    let mut buf = [0u8; FRAME_LEN];
    let mut filled = 0;

    while shared.active.load(Ordering::SeqCst) {
        let file = match device.as_mut() {
            Some(file) => file,
            None => {
                // simulate mode: nothing to read, idle until shutdown
                thread::sleep(LOOP_DELAY);
                continue;
            }
        };

        match file.read(&mut buf[filled..]) {
            Ok(0) => thread::sleep(LOOP_DELAY),
            Ok(n) => {
                filled += n;
                if filled < FRAME_LEN {
                    continue;
                }
                filled = 0;

                match StatusFrame::decode(&buf) {
                    Ok(frame) if frame.is_valid() => {
                        log_frame(&frame);
                        shared.adopt_frame(frame);
                    }
                    Ok(_) => {
                        warn!("invalid status frame from printer, backing off");
                        thread::sleep(DESYNC_DELAY);
                    }
                    Err(err) => warn!("status frame decode failed: {}", err),
                }
            }
            Err(ref err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(LOOP_DELAY),
            Err(ref err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                debug!("status read failed: {}", err);
                thread::sleep(LOOP_DELAY);
            }
        }
    }
    debug!("status reader stopped");
}

fn log_frame(frame: &StatusFrame) {
    info!(
        "printer status: {}, phase: {}",
        frame.status_description(),
        frame.phase_type_description()
    );
    if frame.error_code > 0 {
        warn!(
            "printer error ({:#06x}): {}",
            frame.error_code,
            frame.error_description()
        );
    }
    debug!(
        "status frame: phase {} ({}), notification {}, media {} ({} mm), colors {}/{}",
        frame.phase_description(),
        frame.phase_number,
        frame.notification_description(),
        frame.media_type_description(),
        frame.media_width,
        frame.tape_color_description(),
        frame.text_color_description()
    );
}

fn print_information_command(
    media_type: u8,
    media_width: u8,
    is_starting_page: bool,
    raster_count: u32,
) -> [u8; 13] {
    let mut valid_flags = PI_RECOVER;
    if media_type > MEDIA_TYPE_NO_TAPE {
        valid_flags |= PI_KIND;
    }
    if media_width > 0 {
        valid_flags |= PI_WIDTH;
    }
    let count = raster_count.to_le_bytes();

    [
        0x1B,
        0x69,
        0x7A,
        valid_flags,
        media_type,
        media_width,
        0x00, // media length unused
        count[0],
        count[1],
        count[2],
        count[3],
        is_starting_page as u8,
        0x00,
    ]
}

fn cut_mirror_command(cut: bool, mirror: bool) -> [u8; 4] {
    let mut settings = 0u8;
    // Cut at the beginning of the page; the end cut happens anyway unless
    // chain printing is enabled.
    if cut {
        settings |= 1 << 6;
    }
    if mirror {
        settings |= 1 << 7;
    }
    [0x1B, 0x69, 0x4D, settings]
}

fn advanced_mode_command(
    no_chain_printing: bool,
    special_tape: bool,
    no_buffer_clearing: bool,
) -> [u8; 4] {
    let mut settings = 0u8;
    if no_chain_printing {
        settings |= 1 << 3;
    }
    // Labels are never cut while special tape is installed.
    if special_tape {
        settings |= 1 << 4;
    }
    if no_buffer_clearing {
        settings |= 1 << 7;
    }
    [0x1B, 0x69, 0x4B, settings]
}

fn feed_margins_command(margin_dots: u16) -> [u8; 5] {
    let dots = margin_dots.to_le_bytes();
    [0x1B, 0x69, 0x64, dots[0], dots[1]]
}

// Compression-capable firmware expects the four byte header with an
// explicit line length byte even for literal data; no run-length packing
// is applied to the payload.
fn raster_command(line: &[u8; LINE_BYTES], compression: bool) -> Vec<u8> {
    let mut command = Vec::with_capacity(4 + LINE_BYTES);
    if compression {
        command.extend_from_slice(&[0x47, 0x11, 0x00, 0x10]);
    } else {
        command.extend_from_slice(&[0x47, 0x10, 0x00]);
    }
    command.extend_from_slice(line);
    command
}
