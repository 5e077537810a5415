// BufferPool - lock-free buffer pool with dual SPSC queues
//
// Implements an object pool using two lock-free SPSC (Single Producer Single
// Consumer) ring buffers so the audio callback never allocates. The audio
// thread pops an empty buffer from the pool queue, fills it with captured
// samples, and pushes it onto the data queue; the analysis thread drains the
// data queue and recycles buffers back into the pool queue.

use rtrb::{Consumer, Producer};

/// Audio transfer buffer - pre-allocated vector of f32 samples
pub type AudioBuffer = Vec<f32>;

/// Queue endpoints owned by the audio callback thread.
pub struct AudioThreadChannels {
    /// Consumer for retrieving empty buffers in the audio callback
    pub pool_consumer: Consumer<AudioBuffer>,
    /// Producer for sending filled buffers to the analysis thread
    pub data_producer: Producer<AudioBuffer>,
}

/// Queue endpoints owned by the analysis thread.
pub struct AnalysisThreadChannels {
    /// Consumer for receiving filled buffers from the audio thread
    pub data_consumer: Consumer<AudioBuffer>,
    /// Producer for returning drained buffers to the pool
    pub pool_producer: Producer<AudioBuffer>,
}

/// Lock-free buffer pool using dual SPSC ring buffers
///
/// Pre-allocates a fixed number of transfer buffers and hands back the two
/// thread-side channel halves. All heap allocation happens here, during
/// initialization; queue operations afterwards are wait-free.
pub struct BufferPool;

impl BufferPool {
    /// Create a pool and split it into audio-side and analysis-side channels.
    ///
    /// # Panics
    /// Panics if `buffer_count` or `buffer_size` is 0.
    pub fn new(
        buffer_count: usize,
        buffer_size: usize,
    ) -> (AudioThreadChannels, AnalysisThreadChannels) {
        assert!(buffer_count > 0, "buffer_count must be greater than 0");
        assert!(buffer_size > 0, "buffer_size must be greater than 0");

        let (mut pool_producer, pool_consumer) = rtrb::RingBuffer::new(buffer_count);
        let (data_producer, data_consumer) = rtrb::RingBuffer::new(buffer_count);

        for _ in 0..buffer_count {
            let buffer = vec![0.0_f32; buffer_size];
            pool_producer
                .push(buffer)
                .expect("Failed to push buffer to pool queue during initialization");
        }

        (
            AudioThreadChannels {
                pool_consumer,
                data_producer,
            },
            AnalysisThreadChannels {
                data_consumer,
                pool_producer,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_pool_creation() {
        let (mut audio, mut analysis) = BufferPool::new(16, 2048);

        let mut available_buffers = 0;
        while audio.pool_consumer.pop().is_ok() {
            available_buffers += 1;
        }
        assert_eq!(available_buffers, 16, "Expected 16 buffers in pool queue");

        assert!(
            analysis.data_consumer.pop().is_err(),
            "Data queue should be empty initially"
        );
    }

    #[test]
    fn test_buffer_circulation() {
        let (mut audio, mut analysis) = BufferPool::new(4, 1024);

        // Audio thread: pop from pool, fill, push to data
        let mut buffer = audio.pool_consumer.pop().expect("Should have buffer");
        buffer[0] = 1.0;
        audio.data_producer.push(buffer).expect("Push to data");

        // Analysis thread: pop from data, drain, return to pool
        let buffer = analysis.data_consumer.pop().expect("Should have data");
        assert_eq!(buffer[0], 1.0, "Buffer data should be preserved");
        analysis.pool_producer.push(buffer).expect("Return to pool");

        let buffer = audio.pool_consumer.pop().expect("Buffer back in pool");
        assert_eq!(buffer.len(), 1024, "Buffer size should be unchanged");
    }

    #[test]
    fn test_send() {
        fn assert_send<T: Send>() {}
        // Channel halves move between threads; SPSC forbids sharing via &T
        assert_send::<AudioThreadChannels>();
        assert_send::<AnalysisThreadChannels>();
    }

    #[test]
    fn test_pool_exhaustion() {
        let (mut audio, mut analysis) = BufferPool::new(2, 512);

        for i in 0..2 {
            let mut buffer = audio.pool_consumer.pop().unwrap();
            buffer[0] = i as f32;
            audio.data_producer.push(buffer).unwrap();
        }

        assert!(
            audio.pool_consumer.pop().is_err(),
            "Pool should be exhausted"
        );

        for i in 0..2 {
            let buffer = analysis.data_consumer.pop().unwrap();
            assert_eq!(buffer[0], i as f32);
            analysis.pool_producer.push(buffer).unwrap();
        }

        assert!(audio.pool_consumer.pop().is_ok());
        assert!(audio.pool_consumer.pop().is_ok());
        assert!(audio.pool_consumer.pop().is_err());
    }

    #[test]
    #[should_panic(expected = "buffer_count must be greater than 0")]
    fn test_zero_buffer_count_panics() {
        BufferPool::new(0, 1024);
    }

    #[test]
    #[should_panic(expected = "buffer_size must be greater than 0")]
    fn test_zero_buffer_size_panics() {
        BufferPool::new(16, 0);
    }
}
