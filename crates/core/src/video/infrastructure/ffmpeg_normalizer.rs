use std::path::Path;

use crate::video::domain::frame_rate_normalizer::FrameRateNormalizer;

use super::codec_map;

/// Re-times a source to constant frame spacing via decode and re-encode.
///
/// Each output tick at `n / fps` takes the most recent decoded frame at
/// or before it, so slow stretches duplicate frames and fast stretches
/// drop them. Audio packets pass through untouched — the retimed video
/// keeps the source's wall-clock length, which is what keeps it in sync
/// when the audio is muxed back at the end of the pipeline.
pub struct FfmpegFrameRateNormalizer;

// Safety: used from a single thread at a time; ffmpeg pointers are not
// shared across threads.
unsafe impl Send for FfmpegFrameRateNormalizer {}

impl FrameRateNormalizer for FfmpegFrameRateNormalizer {
    fn normalize(
        &self,
        source: &Path,
        target_fps: f64,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let fps_i = target_fps.round() as i32;
        if fps_i <= 0 {
            return Err(format!("invalid target frame rate {target_fps}").into());
        }

        let mut ictx = ffmpeg_next::format::input(source)?;

        let video_in = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video_in_index = video_in.index();
        let video_in_tb = video_in.time_base();
        let decoder_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(video_in.parameters())?;
        let mut decoder = decoder_ctx.decoder().video()?;

        let audio_in = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .map(|s| (s.index(), s.time_base()));

        let mut octx = ffmpeg_next::format::output(output)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec_id = codec_map::codec_for_path(output)?;
        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| format!("encoder {codec_id:?} not available"))?;

        let mut ost = octx.add_stream(Some(codec))?;
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(decoder.width());
        encoder_ctx.set_height(decoder.height());
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps_i));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        let video_ost_index = ost.index();

        // Audio passes through by stream copy.
        let audio_ost_index = match audio_in {
            Some((index, _)) => {
                let params = ictx
                    .stream(index)
                    .ok_or("audio stream vanished")?
                    .parameters();
                let mut ost_audio =
                    octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
                ost_audio.set_parameters(params);
                unsafe {
                    (*ost_audio.parameters().as_mut_ptr()).codec_tag = 0;
                }
                Some(ost_audio.index())
            }
            None => None,
        };

        octx.write_header()?;

        let video_ost_tb = octx
            .stream(video_ost_index)
            .ok_or("missing video output stream")?
            .time_base();
        let audio_ost_tb = audio_ost_index.map(|i| octx.stream(i).unwrap().time_base());

        let mut scaler: Option<ffmpeg_next::software::scaling::Context> = None;
        let mut retimer = Retimer::new(f64::from(fps_i));
        let in_tb_s = video_in_tb.numerator() as f64 / video_in_tb.denominator() as f64;

        let mut receive_all = |decoder: &mut ffmpeg_next::decoder::Video,
                               octx: &mut ffmpeg_next::format::context::Output,
                               retimer: &mut Retimer,
                               scaler: &mut Option<ffmpeg_next::software::scaling::Context>|
         -> Result<(), Box<dyn std::error::Error>> {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            while decoder.receive_frame(&mut decoded).is_ok() {
                let scl = match scaler {
                    Some(s) => s,
                    None => scaler.insert(ffmpeg_next::software::scaling::Context::get(
                        decoded.format(),
                        decoded.width(),
                        decoded.height(),
                        ffmpeg_next::format::Pixel::YUV420P,
                        decoded.width(),
                        decoded.height(),
                        ffmpeg_next::software::scaling::Flags::BILINEAR,
                    )?),
                };
                let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
                scl.run(&decoded, &mut yuv)?;

                let time_s = decoded.timestamp().unwrap_or(0) as f64 * in_tb_s;
                retimer.push(
                    yuv,
                    time_s,
                    &mut encoder,
                    octx,
                    video_ost_index,
                    fps_i,
                    video_ost_tb,
                )?;
            }
            Ok(())
        };

        let mut packet_iter = ictx.packets();
        while let Some((stream, mut packet)) = packet_iter.next() {
            if stream.index() == video_in_index {
                if decoder.send_packet(&packet).is_ok() {
                    receive_all(&mut decoder, &mut octx, &mut retimer, &mut scaler)?;
                }
            } else if let (Some((audio_index, audio_tb)), Some(ost_index), Some(ost_tb)) =
                (audio_in, audio_ost_index, audio_ost_tb)
            {
                if stream.index() == audio_index {
                    packet.rescale_ts(audio_tb, ost_tb);
                    packet.set_stream(ost_index);
                    packet.set_position(-1);
                    packet.write_interleaved(&mut octx)?;
                }
            }
        }
        drop(packet_iter);

        decoder.send_eof()?;
        receive_all(&mut decoder, &mut octx, &mut retimer, &mut scaler)?;

        retimer.finish(&mut encoder, &mut octx, video_ost_index, fps_i, video_ost_tb)?;

        encoder.send_eof()?;
        drain_packets(&mut encoder, &mut octx, video_ost_index, fps_i, video_ost_tb)?;

        octx.write_trailer()?;
        Ok(())
    }
}

/// Maps decoded frame times onto the constant output tick grid.
///
/// A frame becomes "current" at its own timestamp; every tick before the
/// next frame's timestamp re-emits it. The last frame is emitted exactly
/// once at flush.
struct Retimer {
    fps: f64,
    first_time: Option<f64>,
    pending: Option<ffmpeg_next::util::frame::video::Video>,
    out_count: i64,
}

impl Retimer {
    fn new(fps: f64) -> Self {
        Self {
            fps,
            first_time: None,
            pending: None,
            out_count: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        frame: ffmpeg_next::util::frame::video::Video,
        time_s: f64,
        encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
        octx: &mut ffmpeg_next::format::context::Output,
        stream_index: usize,
        fps_i: i32,
        ost_tb: ffmpeg_next::Rational,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let rel = time_s - *self.first_time.get_or_insert(time_s);

        if let Some(mut prev) = self.pending.take() {
            while (self.out_count as f64) / self.fps < rel - 1e-6 {
                prev.set_pts(Some(self.out_count));
                encoder.send_frame(&prev)?;
                drain_packets(encoder, octx, stream_index, fps_i, ost_tb)?;
                self.out_count += 1;
            }
        }

        self.pending = Some(frame);
        Ok(())
    }

    fn finish(
        &mut self,
        encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
        octx: &mut ffmpeg_next::format::context::Output,
        stream_index: usize,
        fps_i: i32,
        ost_tb: ffmpeg_next::Rational,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut last) = self.pending.take() {
            last.set_pts(Some(self.out_count));
            encoder.send_frame(&last)?;
            drain_packets(encoder, octx, stream_index, fps_i, ost_tb)?;
            self.out_count += 1;
        }
        Ok(())
    }
}

fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    fps_i: i32,
    ost_tb: ffmpeg_next::Rational,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(ffmpeg_next::Rational(1, fps_i), ost_tb);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}
