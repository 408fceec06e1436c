use std::io::Write;
use std::path::{Path, PathBuf};

use crate::video::domain::stream_concatenator::StreamConcatenator;

/// Joins same-codec part files by packet-level stream copy.
///
/// Packets are copied in manifest order with timestamps shifted by the
/// accumulated length of the preceding parts; nothing is re-encoded, so
/// the join is bit-exact per part. All parts must come from the same
/// writer configuration — that is guaranteed upstream, where every
/// worker opens its writer with the same metadata and codec.
pub struct FfmpegStreamConcatenator;

// Safety: used from a single thread at a time; ffmpeg pointers are not
// shared across threads.
unsafe impl Send for FfmpegStreamConcatenator {}

impl StreamConcatenator for FfmpegStreamConcatenator {
    fn concatenate(
        &self,
        parts: &[PathBuf],
        manifest: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if parts.is_empty() {
            return Err("nothing to concatenate".into());
        }

        ffmpeg_next::init()?;
        write_manifest(parts, manifest)?;

        let mut octx = ffmpeg_next::format::output(output)?;

        // Output stream parameters come from the first part.
        {
            let ictx = ffmpeg_next::format::input(&parts[0])?;
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or("no video stream in first part")?;
            let mut ost =
                octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
            ost.set_parameters(stream.parameters());
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
        }

        octx.write_header()?;
        let ost_tb = octx.stream(0).ok_or("missing output stream")?.time_base();

        let mut offset: i64 = 0; // accumulated length, in output time base
        for part in parts {
            let mut ictx = ffmpeg_next::format::input(part)?;
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| format!("no video stream in {}", part.display()))?;
            let in_index = stream.index();
            let in_tb = stream.time_base();
            let part_len = part_length(&stream, ost_tb);

            let mut max_end: i64 = 0;
            for (s, mut packet) in ictx.packets() {
                if s.index() != in_index {
                    continue;
                }
                packet.rescale_ts(in_tb, ost_tb);
                let end = packet
                    .pts()
                    .or(packet.dts())
                    .unwrap_or(0)
                    .saturating_add(packet.duration().max(1));
                max_end = max_end.max(end);

                if let Some(pts) = packet.pts() {
                    packet.set_pts(Some(pts + offset));
                }
                if let Some(dts) = packet.dts() {
                    packet.set_dts(Some(dts + offset));
                }
                packet.set_stream(0);
                packet.set_position(-1);
                packet.write_interleaved(&mut octx)?;
            }

            offset += part_len.unwrap_or(max_end);
        }

        octx.write_trailer()?;
        Ok(())
    }
}

/// The inputs in join order, one per line, kept next to the output so a
/// failed run can be reproduced by hand.
fn write_manifest(parts: &[PathBuf], manifest: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(manifest)?;
    for part in parts {
        writeln!(file, "file '{}'", part.display())?;
    }
    Ok(())
}

/// Stream length in output time-base units, when the container knows it.
fn part_length(
    stream: &ffmpeg_next::format::stream::Stream,
    ost_tb: ffmpeg_next::Rational,
) -> Option<i64> {
    let duration = stream.duration();
    if duration <= 0 {
        return None;
    }
    let in_tb = stream.time_base();
    let seconds = duration as f64 * in_tb.numerator() as f64 / in_tb.denominator() as f64;
    Some((seconds * ost_tb.denominator() as f64 / ost_tb.numerator() as f64).round() as i64)
}
