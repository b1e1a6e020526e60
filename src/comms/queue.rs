//! Bounded single-producer/single-consumer queues.
//!
//! Thin wrappers over `rtrb` ring buffers. Both ends are wait-free: a push
//! either lands or reports the queue full, a pop either yields a message or
//! reports it empty. Storage is allocated once in [`queue`].

use rtrb::{Consumer, Producer, RingBuffer};

pub struct Sender<T> {
    producer: Producer<T>,
    dropped: u64,
}

pub struct Receiver<T> {
    consumer: Consumer<T>,
}

/// Create a queue holding exactly `capacity` messages.
pub fn queue<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (producer, consumer) = RingBuffer::<T>::new(capacity);
    (
        Sender {
            producer,
            dropped: 0,
        },
        Receiver { consumer },
    )
}

impl<T> Sender<T> {
    /// Push `msg`, or drop it and return false when the queue is full.
    ///
    /// A dropped message is gone; retrying is the caller's business.
    #[inline]
    pub fn try_enqueue(&mut self, msg: T) -> bool {
        match self.producer.push(msg) {
            Ok(()) => true,
            Err(_) => {
                self.dropped += 1;
                false
            }
        }
    }

    /// Messages refused so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T> Receiver<T> {
    #[inline]
    pub fn try_dequeue(&mut self) -> Option<T> {
        self.consumer.pop().ok()
    }

    /// Messages waiting.
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }
}
