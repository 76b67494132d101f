use std::ops::{Deref, DerefMut};

use anyhow::{Error, Result};
use mien_img::LandmarkProvider;
use tracing::trace;

/// Fixed set of landmark providers shared between requests.
///
/// Each provider is used by one request at a time: [`LandmarkerPool::acquire`] waits for an idle
/// one and hands it out as a [`Pooled`] guard, which puts it back when dropped.
pub struct LandmarkerPool<P> {
    idle_tx: flume::Sender<P>,
    idle_rx: flume::Receiver<P>,
    size: usize,
}

pub struct Pooled<P> {
    provider: Option<P>,
    home: flume::Sender<P>,
}

impl<P: LandmarkProvider> LandmarkerPool<P> {
    pub fn new(providers: Vec<P>) -> Result<LandmarkerPool<P>> {
        if providers.is_empty() {
            return Err(Error::msg("Landmarker pool needs at least one provider"));
        }

        let size = providers.len();
        let (idle_tx, idle_rx) = flume::bounded(size);
        for p in providers {
            idle_tx
                .send(p)
                .map_err(|_| Error::msg("Landmarker pool closed while filling"))?;
        }

        Ok(LandmarkerPool {
            idle_tx,
            idle_rx,
            size,
        })
    }

    pub async fn acquire(&self) -> Result<Pooled<P>> {
        let provider = self
            .idle_rx
            .recv_async()
            .await
            .map_err(|_| Error::msg("Landmarker pool closed"))?;
        trace!("Acquired landmarker, {}/{} idle", self.idle(), self.size());

        Ok(Pooled {
            provider: Some(provider),
            home: self.idle_tx.clone(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }
}

impl<P> Deref for Pooled<P> {
    type Target = P;

    fn deref(&self) -> &P {
        // only taken in drop
        self.provider.as_ref().unwrap()
    }
}

impl<P> DerefMut for Pooled<P> {
    fn deref_mut(&mut self) -> &mut P {
        self.provider.as_mut().unwrap()
    }
}

impl<P> Drop for Pooled<P> {
    fn drop(&mut self) {
        if let Some(p) = self.provider.take() {
            // pool gone means shutdown, let the provider drop with us
            let _ = self.home.send(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use mien_img::Landmark;
    use std::time::Duration;

    struct Counting(usize);

    impl LandmarkProvider for Counting {
        fn detect(&mut self, _img: &RgbImage) -> Result<Option<Vec<Landmark>>> {
            self.0 += 1;
            Ok(None)
        }
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(LandmarkerPool::<Counting>::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_guard_returns_provider() -> Result<()> {
        let pool = LandmarkerPool::new(vec![Counting(0)])?;
        assert_eq!(pool.size(), 1);

        {
            let mut p = pool.acquire().await?;
            assert_eq!(pool.idle(), 0);
            p.detect(&RgbImage::new(1, 1))?;
        }
        assert_eq!(pool.idle(), 1);

        // same instance comes back
        let p = pool.acquire().await?;
        assert_eq!(p.0, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() -> Result<()> {
        let pool = LandmarkerPool::new(vec![Counting(0)])?;
        let held = pool.acquire().await?;

        let waiting = tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await;
        assert!(waiting.is_err());

        drop(held);
        let again = tokio::time::timeout(Duration::from_millis(200), pool.acquire()).await;
        assert!(again.is_ok());
        Ok(())
    }
}
