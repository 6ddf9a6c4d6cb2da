//! Virtio Block Device (legacy MMIO).
//!
//! A 256-byte window of control registers at `0x1000_1000`, speaking the
//! legacy (queue-PFN) virtio-mmio layout the xv6 driver expects: the
//! descriptor table sits at `pfn << 12`, the available ring directly after
//! it, and the used ring one page up.
//!
//! Register reads are served from plain memory, so `init` publishes the
//! identification registers once; guest writes land in memory too and are
//! observed by `check_store`. A write to QueueNotify consumes the available
//! ring: each chain is a block-request header (type/reserved/sector), one
//! data buffer, and a status byte. Completion updates the used ring and
//! posts a machine external interrupt.

use tracing::debug;

use crate::common::constants::PAGE_SIZE;
use crate::soc::memory::SparseMemory;

/// Base physical address of the virtio window.
pub const VIRTIO_BASE: u64 = 0x1000_1000;

/// Size of the recognized register window in bytes.
pub const VIRTIO_SIZE: u64 = 0x100;

/// Magic value register offset ("virt").
const REG_MAGIC: u64 = 0x00;
/// Version register offset (1 = legacy).
const REG_VERSION: u64 = 0x04;
/// Device ID register offset (2 = block device).
const REG_DEVICE_ID: u64 = 0x08;
/// Vendor ID register offset.
const REG_VENDOR_ID: u64 = 0x0C;
/// Guest page size register offset (legacy).
const REG_GUEST_PAGE_SIZE: u64 = 0x28;
/// Queue maximum size register offset.
const REG_QUEUE_NUM_MAX: u64 = 0x34;
/// Queue size register offset.
const REG_QUEUE_NUM: u64 = 0x38;
/// Queue page frame number register offset (legacy).
const REG_QUEUE_PFN: u64 = 0x40;
/// Queue notify register offset.
const REG_QUEUE_NOTIFY: u64 = 0x50;

/// Magic value ("virt" in ASCII).
const MAGIC_VALUE: u32 = 0x7472_6976;
/// Vendor ID value ("QEMU" in ASCII).
const VENDOR_ID_VALUE: u32 = 0x554D_4551;
/// Device ID for a block device.
const DEVICE_ID_BLOCK: u32 = 2;
/// Maximum queue size this device supports.
const QUEUE_NUM_MAX: u32 = 8;

/// Size of one virtqueue descriptor in bytes.
const DESC_SIZE: u64 = 16;

/// Block request type: read a sector.
const BLK_T_IN: u32 = 0;
/// Block request type: write a sector.
const BLK_T_OUT: u32 = 1;

/// Bytes per disk sector.
const SECTOR_SIZE: u64 = 512;

/// The virtio block device.
pub struct VirtioBlock {
    disk: Vec<u8>,
    queue_num: u32,
    last_avail_idx: u16,
    notify_pending: bool,
    interrupt: bool,
}

impl VirtioBlock {
    /// Creates a block device with an empty disk.
    pub fn new() -> Self {
        Self {
            disk: Vec::new(),
            queue_num: QUEUE_NUM_MAX,
            last_avail_idx: 0,
            notify_pending: false,
            interrupt: false,
        }
    }

    /// Attaches a disk image.
    pub fn set_disk(&mut self, image: Vec<u8>) {
        self.disk = image;
    }

    /// Returns a view of the disk contents.
    pub fn disk(&self) -> &[u8] {
        &self.disk
    }

    /// Publishes the identification registers into the MMIO window.
    pub fn init(&self, mem: &mut SparseMemory) {
        mem.write_u32(VIRTIO_BASE + REG_MAGIC, MAGIC_VALUE);
        mem.write_u32(VIRTIO_BASE + REG_VERSION, 1);
        mem.write_u32(VIRTIO_BASE + REG_DEVICE_ID, DEVICE_ID_BLOCK);
        mem.write_u32(VIRTIO_BASE + REG_VENDOR_ID, VENDOR_ID_VALUE);
        mem.write_u32(VIRTIO_BASE + REG_QUEUE_NUM_MAX, QUEUE_NUM_MAX);
    }

    /// Latches a store into the register window.
    pub fn check_store(&mut self, addr: u64, value: u64) {
        if !(VIRTIO_BASE..VIRTIO_BASE + VIRTIO_SIZE).contains(&addr) {
            return;
        }
        match addr - VIRTIO_BASE {
            REG_QUEUE_NUM => {
                let num = value as u32;
                self.queue_num = num.clamp(1, QUEUE_NUM_MAX);
            }
            REG_QUEUE_NOTIFY => {
                self.notify_pending = true;
            }
            REG_GUEST_PAGE_SIZE | REG_QUEUE_PFN => {
                // The values live in memory; the queue walk reads them there.
            }
            _ => {}
        }
    }

    /// Processes a pending queue notification.
    pub fn emulate(&mut self, mem: &mut SparseMemory) {
        if self.notify_pending {
            self.notify_pending = false;
            self.process_queue(mem);
        }
    }

    /// Consumes the completion interrupt flag.
    pub fn take_interrupt(&mut self) -> bool {
        let pending = self.interrupt;
        self.interrupt = false;
        pending
    }

    /// Consumes every chain the driver has made available.
    fn process_queue(&mut self, mem: &mut SparseMemory) {
        let pfn = mem.read_u32(VIRTIO_BASE + REG_QUEUE_PFN) as u64;
        if pfn == 0 {
            return;
        }
        let num = self.queue_num as u64;
        let desc_base = pfn << 12;
        let avail_base = desc_base + DESC_SIZE * num;
        let used_base = desc_base + PAGE_SIZE;

        let avail_idx = mem.read_u16(avail_base + 2);
        while self.last_avail_idx != avail_idx {
            let slot = (self.last_avail_idx as u64) % num;
            let head = mem.read_u16(avail_base + 4 + 2 * slot);
            debug!(head, "virtio block request");
            self.process_chain(mem, desc_base, used_base, head);
            self.last_avail_idx = self.last_avail_idx.wrapping_add(1);
        }
        self.interrupt = true;
    }

    /// Executes one descriptor chain: header, data buffer, status byte.
    fn process_chain(&mut self, mem: &mut SparseMemory, desc_base: u64, used_base: u64, head: u16) {
        let (header_addr, _, header_next) = self.read_desc(mem, desc_base, head);
        let request_type = mem.read_u32(header_addr);
        let sector = mem.read_u64(header_addr + 8);

        let (data_addr, data_len, data_next) = self.read_desc(mem, desc_base, header_next);
        let disk_offset = sector * SECTOR_SIZE;

        match request_type {
            BLK_T_OUT => {
                for i in 0..data_len as u64 {
                    let index = (disk_offset + i) as usize;
                    if index < self.disk.len() {
                        self.disk[index] = mem.read_u8(data_addr + i);
                    }
                }
            }
            BLK_T_IN => {
                for i in 0..data_len as u64 {
                    let index = (disk_offset + i) as usize;
                    let byte = if index < self.disk.len() {
                        self.disk[index]
                    } else {
                        0
                    };
                    mem.write_u8(data_addr + i, byte);
                }
            }
            other => {
                debug!(request = other, "unrecognized virtio block request type");
            }
        }

        // Status byte: zero reports success.
        let (status_addr, _, _) = self.read_desc(mem, desc_base, data_next);
        mem.write_u8(status_addr, 0);

        let written = if request_type == BLK_T_IN { data_len } else { 0 };
        let used_idx = mem.read_u16(used_base + 2);
        let elem = used_base + 4 + 8 * ((used_idx as u64) % self.queue_num as u64);
        mem.write_u32(elem, head as u32);
        mem.write_u32(elem + 4, written);
        mem.write_u16(used_base + 2, used_idx.wrapping_add(1));
    }

    /// Reads descriptor `index`: `(buffer address, length, next index)`.
    fn read_desc(&self, mem: &SparseMemory, desc_base: u64, index: u16) -> (u64, u32, u16) {
        let base = desc_base + (index as u64 % self.queue_num as u64) * DESC_SIZE;
        let addr = mem.read_u64(base);
        let len = mem.read_u32(base + 8);
        let next = mem.read_u16(base + 14);
        (addr, len, next)
    }
}

impl Default for VirtioBlock {
    fn default() -> Self {
        Self::new()
    }
}
