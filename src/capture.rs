use std::io::Read;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

use crate::pipeline::FrameSource;
use crate::types::RawFrame;

/// Lanza el hilo productor de frames.
///
/// Lee frames RGB24 crudos de tamaño fijo desde cualquier `Read` (en la
/// práctica, stdin alimentado por un proceso de captura externo: libcamera,
/// ffmpeg, etc.) y los envía por el canal. La cámara en sí queda fuera del
/// sistema; esta es su frontera. Al llegar EOF o fallar la lectura, el hilo
/// suelta el emisor y el lazo de control termina limpiamente.
pub fn start_pipe_capture<R>(
    mut reader: R,
    width: usize,
    height: usize,
    tx: Sender<RawFrame>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let frame_len = RawFrame::byte_len(width, height);
        let mut frames = 0u64;
        loop {
            let mut pixels = vec![0u8; frame_len];
            match reader.read_exact(&mut pixels) {
                Ok(()) => {
                    frames += 1;
                    let frame = RawFrame {
                        width,
                        height,
                        pixels,
                    };
                    if tx.send(frame).is_err() {
                        // El receptor se fue: no queda nadie escuchando
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    info!("Fuente de frames agotada tras {} frames", frames);
                    return;
                }
                Err(e) => {
                    warn!("Lectura de frame falló: {}", e);
                    return;
                }
            }
        }
    })
}

/// Adaptador canal → `FrameSource`. `next_frame` bloquea en `recv`; devuelve
/// `None` cuando el productor cerró el canal.
pub struct ChannelFrameSource {
    rx: Receiver<RawFrame>,
}

impl ChannelFrameSource {
    pub fn new(rx: Receiver<RawFrame>) -> Self {
        Self { rx }
    }
}

impl FrameSource for ChannelFrameSource {
    fn next_frame(&mut self) -> Option<RawFrame> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::io::Cursor;

    #[test]
    fn test_reads_whole_frames_until_eof() {
        // Dos frames 2x2 completos más un resto parcial que debe descartarse
        let frame_len = RawFrame::byte_len(2, 2);
        let mut data = Vec::new();
        data.extend(std::iter::repeat(1u8).take(frame_len));
        data.extend(std::iter::repeat(2u8).take(frame_len));
        data.extend(std::iter::repeat(3u8).take(frame_len / 2));

        let (tx, rx) = bounded(8);
        let handle = start_pipe_capture(Cursor::new(data), 2, 2, tx);

        let mut source = ChannelFrameSource::new(rx);
        let first = source.next_frame().unwrap();
        assert_eq!(first.pixels, vec![1u8; frame_len]);
        let second = source.next_frame().unwrap();
        assert_eq!(second.pixels, vec![2u8; frame_len]);
        // El frame parcial no se entrega; el canal se cierra
        assert!(source.next_frame().is_none());

        handle.join().unwrap();
    }

    #[test]
    fn test_empty_input_closes_channel() {
        let (tx, rx) = bounded(1);
        let handle = start_pipe_capture(Cursor::new(Vec::new()), 4, 4, tx);
        let mut source = ChannelFrameSource::new(rx);
        assert!(source.next_frame().is_none());
        handle.join().unwrap();
    }
}
