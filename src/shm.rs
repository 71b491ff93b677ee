//! Page-rounded framebuffer region shared between the daemon and a client
//!
//! The daemon creates a file (normally under `/dev/shm`) and maps it; the
//! client maps the same file after a successful `Map` request. Writes from
//! either side are visible to the other without a copy. There is no locking
//! between a client drawing and the daemon refreshing.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{OledError, Result};
use crate::ssd1306::graphics::Framebuffer;
use crate::ssd1306::BUFFER_SIZE;

const FALLBACK_PAGE_SIZE: usize = 4096;

/// System page size, 4096 if the query fails
pub fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// Round `len` up to a whole number of pages, at least one page
pub fn round_to_page(len: usize) -> usize {
    let page = page_size();
    len.max(1).div_ceil(page) * page
}

/// The daemon's side of the shared framebuffer
pub struct SharedRegion {
    path: PathBuf,
    map: MmapMut,
}

impl SharedRegion {
    /// Create (or truncate) the backing file at a page-rounded size holding
    /// at least `len` bytes, and map it zero-filled.
    pub fn create(path: impl AsRef<Path>, len: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        let size = round_to_page(len);
        file.set_len(size as u64)?;

        // SAFETY: the file was just sized; other processes may write it
        // concurrently, which only tears pixel data.
        let map = unsafe { MmapOptions::new().len(size).map_mut(&file)? };
        log::info!("Framebuffer region {} mapped, {} bytes", path.display(), size);
        Ok(Self { path, map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Unlink the backing file. The mapping stays valid until dropped.
    pub fn remove_file(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::info!("Removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

impl AsRef<[u8]> for SharedRegion {
    fn as_ref(&self) -> &[u8] {
        &self.map
    }
}

impl AsMut<[u8]> for SharedRegion {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.map
    }
}

/// The client's view of the daemon's region
pub struct SharedFramebuffer {
    map: MmapMut,
}

impl SharedFramebuffer {
    /// Map `len` bytes of the file the daemon announced
    pub fn open(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let file: File = OpenOptions::new().read(true).write(true).open(path)?;
        let available = file.metadata()?.len() as usize;
        if len < BUFFER_SIZE || len > available {
            return Err(OledError::SizeMismatch {
                requested: len,
                available,
            });
        }

        // SAFETY: length checked against the file above
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        log::debug!("Mapped {} bytes of {}", len, path.display());
        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.map
    }

    /// Drawing surface over the first [`BUFFER_SIZE`] bytes
    pub fn framebuffer(&mut self) -> Result<Framebuffer<'_>> {
        Framebuffer::bind(&mut self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_whole_pages() {
        let page = page_size();
        assert_eq!(round_to_page(1), page);
        assert_eq!(round_to_page(BUFFER_SIZE), page.max(BUFFER_SIZE));
        assert_eq!(round_to_page(page), page);
        assert_eq!(round_to_page(page + 1), 2 * page);
    }

    #[test]
    fn writes_are_shared_between_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb");
        let mut region = SharedRegion::create(&path, BUFFER_SIZE).unwrap();
        assert_eq!(region.len(), round_to_page(BUFFER_SIZE));

        let mut client = SharedFramebuffer::open(&path, BUFFER_SIZE).unwrap();
        client.as_bytes_mut()[10] = 0x5A;
        assert_eq!(region.as_ref()[10], 0x5A);

        region.as_mut()[11] = 0xA5;
        assert_eq!(client.as_bytes()[11], 0xA5);
    }

    #[test]
    fn client_rejects_bad_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb");
        let region = SharedRegion::create(&path, BUFFER_SIZE).unwrap();

        assert!(matches!(
            SharedFramebuffer::open(&path, 512),
            Err(OledError::SizeMismatch { .. })
        ));
        assert!(matches!(
            SharedFramebuffer::open(&path, region.len() + 1),
            Err(OledError::SizeMismatch { .. })
        ));

        region.remove_file();
        assert!(!path.exists());
        region.remove_file();
    }
}
