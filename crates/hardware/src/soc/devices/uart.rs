//! UART transmit/receive.
//!
//! A six-byte window at `0x1000_0000`. Offset +0 is the TX/RX holding
//! register; offset +5 is the line status register (bit 5 = TX ready, bit 0
//! = RX data ready). Transmitted bytes are buffered and flushed to the
//! character sink on newline. Received bytes are queued by the embedder;
//! the data-ready flag tracks the queue, and a byte is dequeued into the
//! holding register only when a load actually targets it, so unrelated
//! loads never consume input.

use std::collections::VecDeque;
use std::io::{self, Write};

use crate::soc::memory::SparseMemory;

/// Base physical address of the UART window.
pub const UART_BASE: u64 = 0x1000_0000;

/// Size of the UART window in bytes.
pub const UART_SIZE: u64 = 6;

/// Line status register: receive data ready.
const LSR_DATA_READY: u8 = 0x01;

/// Line status register: transmitter ready.
const LSR_TX_READY: u8 = 0x20;

/// Threshold for flushing the transmit buffer regardless of newlines.
const TX_BUFFER_FLUSH_THRESHOLD: usize = 4096;

/// The UART device.
pub struct Uart {
    tx_pending: Option<u8>,
    tx_buffer: Vec<u8>,
    rx_queue: VecDeque<u8>,
    sink: Box<dyn Write + Send>,
}

impl Uart {
    /// Creates a UART transmitting to stdout.
    pub fn new() -> Self {
        Self {
            tx_pending: None,
            tx_buffer: Vec::new(),
            rx_queue: VecDeque::new(),
            sink: Box::new(io::stdout()),
        }
    }

    /// Replaces the character sink (used by tests to capture output).
    pub fn set_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.sink = sink;
    }

    /// Queues input bytes for the guest to receive.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.rx_queue.extend(bytes.iter().copied());
    }

    /// Marks the transmitter ready in the status register.
    pub fn init(&self, mem: &mut SparseMemory) {
        let lsr = mem.read_u8(UART_BASE + 5);
        mem.write_u8(UART_BASE + 5, lsr | LSR_TX_READY);
    }

    /// Latches a store that hits the TX holding register.
    pub fn check_store(&mut self, addr: u64, width: usize, value: u64) {
        if addr <= UART_BASE && UART_BASE < addr + width as u64 {
            let offset = UART_BASE - addr;
            self.tx_pending = Some((value >> (offset * 8)) as u8);
        }
    }

    /// Refreshes the status flags ahead of a load of `load_addr`, and
    /// dequeues the next received byte into the holding register when the
    /// load targets it.
    pub fn publish(&mut self, mem: &mut SparseMemory, load_addr: u64) {
        if load_addr == UART_BASE {
            if let Some(byte) = self.rx_queue.pop_front() {
                mem.write_u8(UART_BASE, byte);
            }
        }
        let mut lsr = mem.read_u8(UART_BASE + 5) | LSR_TX_READY;
        if self.rx_queue.is_empty() {
            lsr &= !LSR_DATA_READY;
        } else {
            lsr |= LSR_DATA_READY;
        }
        mem.write_u8(UART_BASE + 5, lsr);
    }

    /// Emits a latched TX byte to the sink.
    pub fn emulate(&mut self) {
        if let Some(byte) = self.tx_pending.take() {
            self.tx_buffer.push(byte);
            if byte == b'\n' || self.tx_buffer.len() >= TX_BUFFER_FLUSH_THRESHOLD {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        if !self.tx_buffer.is_empty() {
            let _ = self.sink.write_all(&self.tx_buffer);
            let _ = self.sink.flush();
            self.tx_buffer.clear();
        }
    }
}

impl Drop for Uart {
    fn drop(&mut self) {
        self.flush();
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}
