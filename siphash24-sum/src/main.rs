use std::{
    env,
    fs::File,
    hash::Hasher,
    io::Read,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};
use siphash24::{Engine, SipHash24, KEY_LENGTH};

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T, E = Error> = std::result::Result<T, E>;

const BUFFER_SIZE: usize = 16 * 1024;
const BUFFER_COUNT: usize = 8;

const KEY_VARIABLE: &str = "SIPHASH24_KEY";

fn main() -> Result<()> {
    let engine = engine_from_env()?;

    for path in env::args_os().skip(1) {
        let path = PathBuf::from(path);
        let hash = hash_one_file(engine, &path)?;
        println!("{hash:016x}  {}", path.display());
    }

    Ok(())
}

/// Reads the key as 32 hex digits, first byte first. The all-zero key
/// is used when the variable is unset.
fn engine_from_env() -> Result<Engine> {
    let Some(hex) = env::var_os(KEY_VARIABLE) else {
        return Ok(Engine::default());
    };

    let hex = hex
        .into_string()
        .map_err(|_| format!("{KEY_VARIABLE} is not valid UTF-8"))?;
    let key = parse_key(&hex)?;

    Ok(Engine::from_key(&key))
}

fn parse_key(hex: &str) -> Result<[u8; KEY_LENGTH]> {
    if hex.len() != KEY_LENGTH * 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!(
            "{KEY_VARIABLE} must be exactly {} hexadecimal digits",
            KEY_LENGTH * 2,
        )
        .into());
    }

    let key = u128::from_str_radix(hex, 16)?;
    Ok(key.to_be_bytes())
}

fn hash_one_file(engine: Engine, path: &Path) -> Result<u64> {
    let mut file = File::open(path)?;
    let mut hasher = SipHash24::with_engine(engine);

    let (tx, rx) = mpsc::sync_channel(BUFFER_COUNT);
    let (tx2, rx2) = mpsc::sync_channel(BUFFER_COUNT);

    for _ in 0..BUFFER_COUNT {
        tx.send(vec![0; BUFFER_SIZE])
            .expect("Must be able to populate initial buffers");
    }

    thread::scope(|scope| {
        let reader = scope.spawn(move || {
            while let Ok(mut buffer) = rx.recv() {
                let n_bytes = file.read(&mut buffer)?;

                if n_bytes == 0 {
                    break;
                }

                tx2.send((buffer, n_bytes))?;
            }

            Ok::<_, Error>(())
        });

        let hashing = scope.spawn({
            let hasher = &mut hasher;
            move || {
                while let Ok((buffer, n_bytes)) = rx2.recv() {
                    hasher.write(&buffer[..n_bytes]);

                    // The reader has finished; the buffer can be dropped.
                    let _ = tx.send(buffer);
                }

                Ok::<_, Error>(())
            }
        });

        reader.join().map_err(|_| "the reading thread panicked")??;
        hashing.join().map_err(|_| "the hashing thread panicked")??;

        Ok::<_, Error>(())
    })?;

    Ok(hasher.finish())
}

#[cfg(test)]
mod test {
    use std::{fs, io::Write};

    use super::*;

    #[test]
    fn key_is_read_in_written_byte_order() -> Result<()> {
        let key = parse_key("000102030405060708090a0b0c0d0e0f")?;
        assert_eq!(key, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        Ok(())
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for hex in ["", "00", "000102030405060708090a0b0c0d0e0f00", "+00102030405060708090a0b0c0d0e0f", "zz0102030405060708090a0b0c0d0e0f"] {
            assert!(parse_key(hex).is_err(), "{hex:?} should be rejected");
        }
    }

    #[test]
    fn file_hash_matches_in_memory_hash() -> Result<()> {
        let data: Vec<u8> = (0..=255).cycle().take(3 * BUFFER_SIZE + 5).collect();

        let path = env::temp_dir().join(format!("siphash24-sum-{}", std::process::id()));
        File::create(&path)?.write_all(&data)?;

        let engine = Engine::from_key(&parse_key("000102030405060708090a0b0c0d0e0f")?);
        let hash = hash_one_file(engine, &path);
        fs::remove_file(&path)?;

        assert_eq!(hash?, engine.compute(&data));
        Ok(())
    }
}
