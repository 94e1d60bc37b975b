use std::time::Duration;

use crate::capture::domain::camera_source::{CameraSource, CaptureError};
use crate::shared::frame::Frame;

/// Back-off when a non-blocking device reports that no frame is ready yet.
const RETRY_DELAY: Duration = Duration::from_millis(5);

/// What to open: a capture device behind a libavdevice input format
/// (`v4l2`, `avfoundation`, `dshow`), or a plain file/URL probed by libavformat.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSpec {
    pub device: String,
    pub input_format: Option<String>,
}

impl CameraSpec {
    pub fn device(device: impl Into<String>, input_format: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            input_format: Some(input_format.into()),
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            device: path.into(),
            input_format: None,
        }
    }
}

/// Captures frames via ffmpeg-next (libavdevice + libavcodec).
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`].
/// End of stream and every read error other than `EAGAIN` surface as
/// capture failures.
pub struct FfmpegCamera {
    device: String,
    session: Option<CaptureSession>,
}

// Safety: FfmpegCamera is only used from the sampling thread.
// The raw pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegCamera {}

impl FfmpegCamera {
    pub fn open(spec: &CameraSpec) -> Result<Self, CaptureError> {
        let open_error = |reason: String| CaptureError::Open {
            device: spec.device.clone(),
            reason,
        };

        ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;
        let ictx = open_input(spec).map_err(open_error)?;
        let session = CaptureSession::new(ictx).map_err(open_error)?;

        log::info!(
            "Opened camera {} ({}x{})",
            spec.device,
            session.width,
            session.height
        );
        Ok(Self {
            device: spec.device.clone(),
            session: Some(session),
        })
    }
}

impl CameraSource for FfmpegCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NotOpen)?;
        session.next_frame()
    }

    fn release(&mut self) {
        if self.session.take().is_some() {
            log::info!("Released camera {}", self.device);
        }
    }
}

fn open_input(spec: &CameraSpec) -> Result<ffmpeg_next::format::context::Input, String> {
    let Some(format_name) = spec.input_format.as_deref() else {
        return ffmpeg_next::format::input(&spec.device).map_err(|e| e.to_string());
    };

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == format_name)
        .ok_or_else(|| format!("input format '{format_name}' is not available"))?;

    let context = ffmpeg_next::format::open_with(
        &spec.device,
        &ffmpeg_next::format::format::Format::Input(format),
        ffmpeg_next::Dictionary::new(),
    )
    .map_err(|e| e.to_string())?;

    match context {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        ffmpeg_next::format::context::Context::Output(_) => {
            Err(format!("'{format_name}' did not open as an input"))
        }
    }
}

/// Open demuxer, decoder and RGB scaler for the best video stream.
struct CaptureSession {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
    draining: bool,
}

impl CaptureSession {
    fn new(ictx: ffmpeg_next::format::context::Input) -> Result<Self, String> {
        let (stream_index, decoder) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| "no video stream found".to_string())?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| e.to_string())?;
            let decoder = codec_ctx.decoder().video().map_err(|e| e.to_string())?;
            (stream.index(), decoder)
        };

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err("camera reported an empty frame size".to_string());
        }

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| e.to_string())?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            frame_index: 0,
            draining: false,
        })
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        loop {
            if let Some(frame) = self.receive()? {
                return Ok(frame);
            }
            if self.draining {
                return Err(CaptureError::EndOfStream);
            }

            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.ictx) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    if let Err(e) = self.decoder.send_eof() {
                        log::debug!("Decoder rejected end of stream: {e}");
                    }
                    self.draining = true;
                    continue;
                }
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::util::error::EAGAIN =>
                {
                    std::thread::sleep(RETRY_DELAY);
                    continue;
                }
                Err(e) => return Err(CaptureError::Device(e.to_string())),
            }

            if packet.stream() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
            }
        }
    }

    fn receive(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is dropped.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
