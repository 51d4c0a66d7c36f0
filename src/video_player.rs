use anyhow::{anyhow, Result};
use eframe::epaint::ColorImage;
use gstreamer::prelude::*;
use gstreamer::{Bin, Element, ElementFactory, MessageView, State};
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFrame, VideoInfo};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::playback::PlaybackEngine;

const NSECS_PER_SEC: f64 = 1_000_000_000.0;

/// GStreamer-backed playback engine. Decoded RGBA frames are pushed through a
/// watch channel for the UI to upload as a texture.
pub struct VideoPlayer {
    pipeline: Element,
    prerolled: Arc<Mutex<bool>>,
    eos: Arc<Mutex<bool>>,
    error: Arc<Mutex<Option<String>>>,
}

impl VideoPlayer {
    pub fn new(uri: &str, frame_sender: watch::Sender<Option<ColorImage>>) -> Result<Self> {
        info!("Creating pipeline for URI: {}", uri);

        let pipeline = ElementFactory::make("playbin")
            .name("playbin")
            .build()
            .map_err(|e| anyhow!("Failed to create playbin: {:?}", e))?;
        pipeline.set_property("uri", uri);

        // Video path: convert/scale to RGBA and hand frames to an appsink.
        let video_bin = Bin::new();
        let videoconvert = ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| anyhow!("Failed to create videoconvert: {:?}", e))?;
        let videoscale = ElementFactory::make("videoscale")
            .build()
            .map_err(|e| anyhow!("Failed to create videoscale: {:?}", e))?;
        let capsfilter = ElementFactory::make("capsfilter")
            .build()
            .map_err(|e| anyhow!("Failed to create capsfilter: {:?}", e))?;
        capsfilter.set_property(
            "caps",
            &gstreamer::Caps::builder("video/x-raw")
                .field("format", "RGBA")
                .build(),
        );

        let appsink = AppSink::builder().build();
        appsink.set_max_buffers(1);
        appsink.set_drop(true);

        for element in [&videoconvert, &videoscale, &capsfilter] {
            video_bin
                .add(element)
                .map_err(|e| anyhow!("Failed to add element to video bin: {:?}", e))?;
        }
        video_bin
            .add(&appsink.clone().upcast::<Element>())
            .map_err(|e| anyhow!("Failed to add appsink: {:?}", e))?;
        videoconvert
            .link(&videoscale)
            .map_err(|e| anyhow!("Failed to link videoconvert to videoscale: {:?}", e))?;
        videoscale
            .link(&capsfilter)
            .map_err(|e| anyhow!("Failed to link videoscale to capsfilter: {:?}", e))?;
        capsfilter
            .link(&appsink.clone().upcast::<Element>())
            .map_err(|e| anyhow!("Failed to link capsfilter to appsink: {:?}", e))?;

        let pad = videoconvert
            .static_pad("sink")
            .ok_or_else(|| anyhow!("Failed to get sink pad"))?;
        let ghost_pad = gstreamer::GhostPad::with_target(&pad)
            .map_err(|e| anyhow!("Failed to create ghost pad: {:?}", e))?;
        video_bin
            .add_pad(&ghost_pad)
            .map_err(|e| anyhow!("Failed to add ghost pad: {:?}", e))?;
        pipeline.set_property("video-sink", &video_bin);

        let audiosink = ElementFactory::make("autoaudiosink")
            .build()
            .map_err(|e| anyhow!("Failed to create audio sink: {:?}", e))?;
        pipeline.set_property("audio-sink", &audiosink);

        let player = VideoPlayer {
            pipeline,
            prerolled: Arc::new(Mutex::new(false)),
            eos: Arc::new(Mutex::new(false)),
            error: Arc::new(Mutex::new(None)),
        };

        player.start_bus_watching();
        player.start_frame_extraction(appsink, frame_sender);

        Ok(player)
    }

    fn start_bus_watching(&self) {
        let bus = self.pipeline.bus().expect("Pipeline should have a bus");
        let prerolled = self.prerolled.clone();
        let eos = self.eos.clone();
        let error = self.error.clone();

        std::thread::spawn(move || {
            for msg in bus.iter_timed(gstreamer::ClockTime::NONE) {
                match msg.view() {
                    MessageView::Eos(_) => {
                        info!("End of stream reached");
                        *eos.lock().unwrap() = true;
                    }
                    MessageView::Error(err) => {
                        let error_msg = format!(
                            "Error from {:?}: {} ({:?})",
                            err.src().map(|s| s.path_string()),
                            err.error(),
                            err.debug()
                        );
                        error!("GStreamer error: {}", error_msg);
                        *error.lock().unwrap() = Some(error_msg);
                    }
                    MessageView::Warning(w) => {
                        warn!(
                            "GStreamer warning from {:?}: {} ({:?})",
                            w.src().map(|s| s.path_string()),
                            w.error(),
                            w.debug()
                        );
                    }
                    MessageView::AsyncDone(_) => {
                        debug!("Pipeline prerolled");
                        *prerolled.lock().unwrap() = true;
                    }
                    MessageView::StateChanged(state_changed) => {
                        if let Some(element) = msg.src() {
                            if element.type_().name() == "GstPipeline"
                                && matches!(state_changed.current(), State::Paused | State::Playing)
                            {
                                *prerolled.lock().unwrap() = true;
                            }
                        }
                    }
                    _ => {}
                }
            }
        });
    }

    fn start_frame_extraction(&self, appsink: AppSink, sender: watch::Sender<Option<ColorImage>>) {
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    if let Some(frame) = Self::pull_frame(appsink) {
                        if sender.send(Some(frame)).is_err() {
                            debug!("Frame receiver dropped");
                        }
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );
    }

    fn pull_frame(appsink: &AppSink) -> Option<ColorImage> {
        let sample = appsink.pull_sample().ok()?;
        let buffer = sample.buffer()?;
        let caps = sample.caps()?;
        let video_info = VideoInfo::from_caps(caps).ok()?;
        let frame = VideoFrame::from_buffer_readable(buffer.copy(), &video_info).ok()?;
        let width = video_info.width() as usize;
        let height = video_info.height() as usize;
        let plane_data = frame.plane_data(0).ok()?;
        Some(ColorImage::from_rgba_unmultiplied([width, height], plane_data))
    }

    fn reset_eos(&self) {
        *self.eos.lock().unwrap() = false;
    }
}

impl PlaybackEngine for VideoPlayer {
    fn play(&self) -> Result<()> {
        self.pipeline
            .set_state(State::Playing)
            .map_err(|e| anyhow!("Failed to set pipeline to PLAYING: {:?}", e))?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.pipeline
            .set_state(State::Paused)
            .map_err(|e| anyhow!("Failed to set pipeline to PAUSED: {:?}", e))?;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.pause()?;
        self.seek(0.0)?;
        Ok(())
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        let target = gstreamer::ClockTime::from_nseconds((seconds.max(0.0) * NSECS_PER_SEC) as u64);
        self.pipeline
            .seek_simple(
                gstreamer::SeekFlags::FLUSH | gstreamer::SeekFlags::KEY_UNIT,
                target,
            )
            .map_err(|e| anyhow!("Failed to seek: {:?}", e))?;
        self.reset_eos();
        Ok(())
    }

    fn position(&self) -> Option<f64> {
        self.pipeline
            .query_position::<gstreamer::ClockTime>()
            .map(|t| t.nseconds() as f64 / NSECS_PER_SEC)
    }

    fn duration(&self) -> Option<f64> {
        self.pipeline
            .query_duration::<gstreamer::ClockTime>()
            .map(|t| t.nseconds() as f64 / NSECS_PER_SEC)
    }

    fn is_paused(&self) -> bool {
        let (_, current, _) = self.pipeline.state(gstreamer::ClockTime::ZERO);
        current != State::Playing
    }

    fn is_ready(&self) -> bool {
        *self.prerolled.lock().unwrap() && self.duration().is_some()
    }

    fn set_volume(&self, volume: f64) {
        self.pipeline.set_property("volume", volume.clamp(0.0, 1.0));
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().unwrap().take()
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        debug!("Dropping VideoPlayer, shutting down pipeline");
        let _ = self.pipeline.set_state(State::Paused);
        if let Err(e) = self.pipeline.set_state(State::Null) {
            warn!("Failed to set pipeline to NULL: {:?}", e);
        }
    }
}
