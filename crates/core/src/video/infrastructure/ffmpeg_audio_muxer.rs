use std::path::Path;

use crate::video::domain::audio_muxer::AudioMuxer;

/// Remuxes the original recording's audio onto a processed video.
///
/// Video streams are copied packet-for-packet from `video_source`. The
/// audio track comes from `audio_source`: copied bit-exact when it is
/// already AAC, otherwise decoded and re-encoded to AAC. A source with
/// no audio stream is not an error; the processed video is copied
/// through unchanged so the output still appears at its promised path.
pub struct FfmpegAudioMuxer;

// Safety: used from a single thread at a time; ffmpeg pointers are not
// shared across threads.
unsafe impl Send for FfmpegAudioMuxer {}

impl AudioMuxer for FfmpegAudioMuxer {
    fn mux(
        &self,
        video_source: &Path,
        audio_source: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let audio_codec = {
            let ictx = ffmpeg_next::format::input(audio_source)?;
            ictx.streams()
                .best(ffmpeg_next::media::Type::Audio)
                .map(|s| s.parameters().id())
        };

        match audio_codec {
            None => {
                log::info!(
                    "{} has no audio stream; copying video only",
                    audio_source.display()
                );
                std::fs::copy(video_source, output)?;
                Ok(())
            }
            Some(ffmpeg_next::codec::Id::AAC) => copy_mux(video_source, audio_source, output),
            Some(other) => {
                log::info!(
                    "{} carries {:?} audio; re-encoding to AAC",
                    audio_source.display(),
                    other
                );
                transcode_mux(video_source, audio_source, output)
            }
        }
    }
}

/// Map every video stream of `ictx_video` onto a copy stream of `octx`.
///
/// Returns input index -> output index, -1 for unmapped streams.
fn add_video_copy_streams(
    ictx_video: &ffmpeg_next::format::context::Input,
    octx: &mut ffmpeg_next::format::context::Output,
) -> Result<Vec<isize>, Box<dyn std::error::Error>> {
    let mut map: Vec<isize> = vec![-1; ictx_video.nb_streams() as usize];
    for (idx, stream) in ictx_video.streams().enumerate() {
        if stream.parameters().medium() == ffmpeg_next::media::Type::Video {
            let mut ost =
                octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
            ost.set_parameters(stream.parameters());
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
            map[idx] = ost.index() as isize;
        }
    }
    Ok(map)
}

fn copy_packets(
    ictx: &mut ffmpeg_next::format::context::Input,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_map: &[isize],
) -> Result<(), Box<dyn std::error::Error>> {
    let time_bases: Vec<_> = ictx.streams().map(|s| s.time_base()).collect();
    for (stream, mut packet) in ictx.packets() {
        let ist_idx = stream.index();
        let ost_idx = stream_map[ist_idx];
        if ost_idx < 0 {
            continue;
        }
        let ost_time_base = octx
            .stream(ost_idx as usize)
            .ok_or("missing output stream")?
            .time_base();
        packet.rescale_ts(time_bases[ist_idx], ost_time_base);
        packet.set_position(-1);
        packet.set_stream(ost_idx as usize);
        packet.write_interleaved(octx)?;
    }
    Ok(())
}

/// Bit-exact mux: video streams from one file, audio streams from the
/// other, nothing re-encoded.
fn copy_mux(
    video_source: &Path,
    audio_source: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ictx_video = ffmpeg_next::format::input(video_source)?;
    let mut ictx_audio = ffmpeg_next::format::input(audio_source)?;
    let mut octx = ffmpeg_next::format::output(output)?;

    let video_stream_map = add_video_copy_streams(&ictx_video, &mut octx)?;

    let mut audio_stream_map: Vec<isize> = vec![-1; ictx_audio.nb_streams() as usize];
    for (idx, stream) in ictx_audio.streams().enumerate() {
        if stream.parameters().medium() == ffmpeg_next::media::Type::Audio {
            let mut ost =
                octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
            ost.set_parameters(stream.parameters());
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
            audio_stream_map[idx] = ost.index() as isize;
        }
    }

    octx.write_header()?;

    copy_packets(&mut ictx_video, &mut octx, &video_stream_map)?;
    copy_packets(&mut ictx_audio, &mut octx, &audio_stream_map)?;

    octx.write_trailer()?;
    Ok(())
}

/// Mux with an audio transcode: decode the best audio stream, resample
/// to planar f32, and re-encode as AAC at the source rate and layout.
fn transcode_mux(
    video_source: &Path,
    audio_source: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ictx_video = ffmpeg_next::format::input(video_source)?;
    let mut ictx_audio = ffmpeg_next::format::input(audio_source)?;
    let mut octx = ffmpeg_next::format::output(output)?;

    let video_stream_map = add_video_copy_streams(&ictx_video, &mut octx)?;

    let audio_stream = ictx_audio
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .ok_or("No audio stream in audio source")?;
    let audio_src_idx = audio_stream.index();

    let decoder_ctx =
        ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
    let mut decoder = decoder_ctx.decoder().audio()?;

    // Some demuxers leave the layout unset; fall back to the default
    // layout for the channel count.
    let channel_layout = if decoder.channel_layout().is_empty() {
        ffmpeg_next::ChannelLayout::default(decoder.channels() as i32)
    } else {
        decoder.channel_layout()
    };
    let sample_rate = decoder.rate();

    let aac_codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC)
        .ok_or("AAC encoder not found")?;
    let mut ost_audio = octx.add_stream(Some(aac_codec))?;
    let audio_ost_idx = ost_audio.index();

    let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(aac_codec)
        .encoder()
        .audio()?;
    encoder.set_rate(sample_rate as i32);
    encoder.set_channel_layout(channel_layout);
    encoder.set_format(ffmpeg_next::format::Sample::F32(
        ffmpeg_next::format::sample::Type::Planar,
    ));
    let encoder = encoder.open_as(aac_codec)?;
    ost_audio.set_parameters(&encoder);

    let enc_time_base = encoder.time_base();
    let frame_size = match encoder.frame_size() as usize {
        0 => 1024,
        n => n,
    };

    let mut resampler = ffmpeg_next::software::resampling::Context::get(
        decoder.format(),
        channel_layout,
        decoder.rate(),
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
        channel_layout,
        sample_rate,
    )?;

    octx.write_header()?;

    let ost_audio_tb = octx
        .stream(audio_ost_idx)
        .ok_or("missing output stream")?
        .time_base();

    copy_packets(&mut ictx_video, &mut octx, &video_stream_map)?;

    let mut sink = AacEncodeSink {
        encoder,
        buffered: vec![Vec::new(); channel_layout.channels() as usize],
        frame_size,
        channel_layout,
        sample_rate,
        pts: 0,
        stream_idx: audio_ost_idx,
        enc_time_base,
        ost_time_base: ost_audio_tb,
    };

    let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
    let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

    for (stream, packet) in ictx_audio.packets() {
        if stream.index() != audio_src_idx {
            continue;
        }
        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            sink.push(&resampled, &mut octx)?;
        }
    }

    decoder.send_eof()?;
    while decoder.receive_frame(&mut decoded).is_ok() {
        resampler.run(&decoded, &mut resampled)?;
        sink.push(&resampled, &mut octx)?;
    }
    if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
        if delay.output > 0 {
            sink.push(&resampled, &mut octx)?;
        }
    }

    sink.finish(&mut octx)?;

    octx.write_trailer()?;
    Ok(())
}

/// Buffers planar f32 samples and feeds the AAC encoder in
/// frame-size chunks.
struct AacEncodeSink {
    encoder: ffmpeg_next::codec::encoder::audio::Encoder,
    buffered: Vec<Vec<f32>>,
    frame_size: usize,
    channel_layout: ffmpeg_next::ChannelLayout,
    sample_rate: u32,
    pts: i64,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
}

impl AacEncodeSink {
    fn push(
        &mut self,
        resampled: &ffmpeg_next::util::frame::audio::Audio,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let num_samples = resampled.samples();
        if num_samples == 0 {
            return Ok(());
        }
        for (ch, buf) in self.buffered.iter_mut().enumerate() {
            let data = resampled.data(ch);
            let floats =
                unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
            buf.extend_from_slice(floats);
        }
        self.encode_buffered(false, octx)
    }

    /// Encode every complete frame in the buffer; with `finish` the
    /// trailing partial frame is encoded too.
    fn encode_buffered(
        &mut self,
        finish: bool,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let available = self.buffered.first().map(|b| b.len()).unwrap_or(0);
            let take = if available >= self.frame_size {
                self.frame_size
            } else if finish && available > 0 {
                available
            } else {
                return Ok(());
            };

            let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
                ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
                take,
                self.channel_layout,
            );
            frame.set_rate(self.sample_rate);
            frame.set_pts(Some(self.pts));

            for (ch, buf) in self.buffered.iter_mut().enumerate() {
                let chunk: Vec<f32> = buf.drain(..take).collect();
                let src_bytes = unsafe {
                    std::slice::from_raw_parts(chunk.as_ptr() as *const u8, take * 4)
                };
                let dst = frame.data_mut(ch);
                dst[..src_bytes.len()].copy_from_slice(src_bytes);
            }

            self.encoder.send_frame(&frame)?;
            self.write_packets(octx)?;
            self.pts += take as i64;
        }
    }

    fn finish(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.encode_buffered(true, octx)?;
        self.encoder.send_eof()?;
        self.write_packets(octx)
    }

    fn write_packets(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.stream_idx);
            encoded.rescale_ts(self.enc_time_base, self.ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}
