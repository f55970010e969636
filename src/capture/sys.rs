//! Production raw socket.
//!
//! On Linux an `AF_PACKET`/`SOCK_DGRAM` socket bound to one interface and
//! to the IPv4 EtherType delivers every IPv4 packet seen on it, starting at
//! the IP version nibble. Promiscuous membership widens that to traffic not
//! addressed to the host. Other platforms report
//! [`CaptureError::Unsupported`].

use std::net::Ipv4Addr;

use crate::capture::interface::{InterfaceSource, PnetInterfaces};
use crate::capture::socket::SocketProvider;
use crate::error::CaptureError;

pub use imp::PacketSocket;

/// Opens [`PacketSocket`]s on the interface owning each session address.
#[derive(Debug, Clone, Default)]
pub struct PacketSocketProvider<I = PnetInterfaces> {
    interfaces: I,
}

impl<I: InterfaceSource> PacketSocketProvider<I> {
    pub fn new(interfaces: I) -> Self {
        Self { interfaces }
    }
}

impl<I: InterfaceSource + 'static> SocketProvider for PacketSocketProvider<I> {
    type Socket = PacketSocket;

    fn open(
        &self,
        address: Ipv4Addr,
        _port: u16,
        receive_buffer_size: usize,
    ) -> Result<PacketSocket, CaptureError> {
        let iface = self.interfaces.owner_of(address)?;
        tracing::debug!(%address, interface = %iface.name, index = iface.index, "opening packet socket");
        PacketSocket::open(address, iface.index, receive_buffer_size)
    }
}

#[cfg(target_os = "linux")]
mod imp {
    use std::io;
    use std::mem;
    use std::net::Ipv4Addr;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    use tokio::io::unix::AsyncFd;

    use crate::capture::socket::RawSocket;
    use crate::error::CaptureError;

    const ETH_P_IP: u16 = 0x0800;
    const SOL_PACKET: libc::c_int = 263;
    const PACKET_ADD_MEMBERSHIP: libc::c_int = 1;
    const PACKET_MR_PROMISC: u16 = 1;

    #[repr(C)]
    struct PacketMreq {
        mr_ifindex: libc::c_int,
        mr_type: u16,
        mr_alen: u16,
        mr_address: [u8; 8],
    }

    /// Non-blocking `AF_PACKET` socket registered with the tokio reactor.
    pub struct PacketSocket {
        fd: AsyncFd<OwnedFd>,
        if_index: libc::c_int,
    }

    impl PacketSocket {
        pub fn open(
            address: Ipv4Addr,
            if_index: u32,
            receive_buffer_size: usize,
        ) -> Result<Self, CaptureError> {
            let raw = unsafe {
                libc::socket(
                    libc::AF_PACKET,
                    libc::SOCK_DGRAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                    libc::c_int::from(ETH_P_IP.to_be()),
                )
            };
            if raw < 0 {
                return Err(CaptureError::Open {
                    address,
                    source: io::Error::last_os_error(),
                });
            }
            let fd = unsafe { OwnedFd::from_raw_fd(raw) };
            let if_index = libc::c_int::try_from(if_index).map_err(|_| CaptureError::Bind {
                address,
                source: io::Error::from(io::ErrorKind::InvalidInput),
            })?;

            let mut sll: libc::sockaddr_ll = unsafe { mem::zeroed() };
            sll.sll_family = libc::AF_PACKET as u16;
            sll.sll_protocol = ETH_P_IP.to_be();
            sll.sll_ifindex = if_index;
            let ret = unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    (&raw const sll).cast::<libc::sockaddr>(),
                    mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
                )
            };
            if ret < 0 {
                return Err(CaptureError::Bind {
                    address,
                    source: io::Error::last_os_error(),
                });
            }

            let rcvbuf = libc::c_int::try_from(receive_buffer_size.max(4096)).unwrap_or(libc::c_int::MAX);
            if let Err(source) = set_option(&fd, libc::SOL_SOCKET, libc::SO_RCVBUF, &rcvbuf) {
                tracing::warn!(%address, error = %source, "SO_RCVBUF not applied");
            }

            let mreq = PacketMreq {
                mr_ifindex: if_index,
                mr_type: PACKET_MR_PROMISC,
                mr_alen: 0,
                mr_address: [0; 8],
            };
            set_option(&fd, SOL_PACKET, PACKET_ADD_MEMBERSHIP, &mreq)
                .map_err(|source| CaptureError::Configure { address, source })?;

            let fd = AsyncFd::new(fd).map_err(|source| CaptureError::Configure { address, source })?;
            Ok(Self { fd, if_index })
        }
    }

    /// Frames queued between `socket` and `bind` may come from any interface.
    fn is_captured(origin: &libc::sockaddr_ll, if_index: libc::c_int) -> bool {
        u16::from_be(origin.sll_protocol) == ETH_P_IP && origin.sll_ifindex == if_index
    }

    fn recv_from(fd: &OwnedFd, buf: &mut [u8]) -> io::Result<(usize, libc::sockaddr_ll)> {
        let mut origin: libc::sockaddr_ll = unsafe { mem::zeroed() };
        let mut origin_len = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
        let n = unsafe {
            libc::recvfrom(
                fd.as_raw_fd(),
                buf.as_mut_ptr().cast(),
                buf.len(),
                libc::MSG_TRUNC,
                (&raw mut origin).cast::<libc::sockaddr>(),
                &mut origin_len,
            )
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok((n as usize, origin))
        }
    }

    fn set_option<T>(fd: &OwnedFd, level: libc::c_int, name: libc::c_int, value: &T) -> io::Result<()> {
        let ret = unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                level,
                name,
                (value as *const T).cast::<libc::c_void>(),
                mem::size_of::<T>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    impl RawSocket for PacketSocket {
        async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let if_index = self.if_index;
            loop {
                let mut guard = self.fd.readable().await?;
                match guard.try_io(|fd| recv_from(fd.get_ref(), buf)) {
                    Ok(Ok((received, origin))) if is_captured(&origin, if_index) => {
                        return Ok(received);
                    }
                    Ok(Ok((_, origin))) => {
                        tracing::trace!(
                            protocol = u16::from_be(origin.sll_protocol),
                            if_index = origin.sll_ifindex,
                            "frame outside the capture filter dropped"
                        );
                    }
                    Ok(Err(err)) => return Err(err),
                    Err(_would_block) => continue,
                }
            }
        }
    }

}

#[cfg(not(target_os = "linux"))]
mod imp {
    use std::io;
    use std::net::Ipv4Addr;

    use crate::capture::socket::RawSocket;
    use crate::error::CaptureError;

    /// Placeholder; raw capture is only implemented for Linux.
    pub enum PacketSocket {}

    impl PacketSocket {
        pub fn open(
            _address: Ipv4Addr,
            _if_index: u32,
            _receive_buffer_size: usize,
        ) -> Result<Self, CaptureError> {
            Err(CaptureError::Unsupported)
        }
    }

    impl RawSocket for PacketSocket {
        async fn recv(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            match *self {}
        }
    }
}
