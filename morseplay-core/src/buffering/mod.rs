//! PCM buffers and the lock-free SPSC ring shared with cpal callbacks.
//!
//! Uses `ringbuf::HeapRb<f32>`: `try_pop` (output callback) and `try_push`
//! (input callback) are wait-free and never allocate.

pub mod pcm;

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Observer, Producer};

/// Producer half — filled by the caller before playback, or by the input
/// callback during capture.
pub type SampleProducer = ringbuf::HeapProd<f32>;

/// Consumer half — drained by the output callback, or by the caller after capture.
pub type SampleConsumer = ringbuf::HeapCons<f32>;

/// Create a matched producer/consumer pair able to hold `capacity` samples.
///
/// A zero capacity is bumped to one sample; `HeapRb` requires a non-empty ring.
pub fn create_sample_ring(capacity: usize) -> (SampleProducer, SampleConsumer) {
    HeapRb::<f32>::new(capacity.max(1)).split()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_holds_whole_buffer() {
        let samples = vec![0.25f32; 1_000];
        let (mut producer, mut consumer) = create_sample_ring(samples.len());
        assert_eq!(producer.push_slice(&samples), samples.len());
        assert_eq!(consumer.occupied_len(), samples.len());
        assert_eq!(consumer.try_pop(), Some(0.25));
    }

    #[test]
    fn full_ring_refuses_pushes() {
        let (mut producer, mut consumer) = create_sample_ring(2);
        assert!(producer.try_push(1.0).is_ok());
        assert!(producer.try_push(2.0).is_ok());
        assert_eq!(producer.try_push(3.0), Err(3.0));
        assert_eq!(consumer.pop_iter().collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn zero_capacity_ring_is_usable() {
        let (mut producer, mut consumer) = create_sample_ring(0);
        assert_eq!(producer.push_slice(&[1.0, 2.0]), 1);
        assert_eq!(consumer.try_pop(), Some(1.0));
        assert_eq!(consumer.try_pop(), None);
    }
}
