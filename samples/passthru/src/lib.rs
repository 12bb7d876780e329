use std::ptr;
use wit_guest::{log, OwnedBuffer, OwnedString};

/// The `rec` record of the sample interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rec {
    pub a: u32,
    pub b: i8,
}

/// Return area for `(pointer, length)` results.
static mut RET_AREA: [usize; 2] = [0; 2];

/// Stores a leaked list or string in the return area.
unsafe fn ret_area(ptr: *mut u8, len: usize) -> *mut usize {
    let area = ptr::addr_of_mut!(RET_AREA).cast::<usize>();
    area.write(ptr as usize);
    area.add(1).write(len);
    area
}

#[export_name = "component-b:main#run"]
pub extern "C" fn run() -> i32 {
    let r = Rec {
        a: 0xCAFEBABE,
        b: -128,
    };
    log::info!("a: {:#X}, b: {:#X}", r.a, r.b);
    1
}

#[export_name = "component-b:inter#add"]
pub extern "C" fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

#[export_name = "component-b:main#print-vec"]
pub unsafe extern "C" fn print_vec(ptr: *mut u8, len: usize) -> *mut usize {
    let vec = OwnedBuffer::from_raw_parts(ptr, len);
    log::info!("b: {:?}", vec.as_slice());

    let (ptr, len) = vec.leak();
    ret_area(ptr, len)
}

#[export_name = "cabi_post_component-b:main#print-vec"]
pub unsafe extern "C" fn post_print_vec(ret: *mut usize) {
    OwnedBuffer::drop_raw(*ret as *mut u8, *ret.add(1));
}

#[export_name = "component-b:main#greet"]
pub unsafe extern "C" fn greet(ptr: *mut u8, len: usize) -> *mut usize {
    let name = OwnedString::from_raw_parts(ptr, len);
    let greeting = OwnedString::new(format!("hello, {}!", name.to_string_lossy()));

    let (ptr, len) = greeting.leak();
    ret_area(ptr, len)
}

#[export_name = "cabi_post_component-b:main#greet"]
pub unsafe extern "C" fn post_greet(ret: *mut usize) {
    OwnedString::drop_raw(*ret as *mut u8, *ret.add(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::slice;

    /// Lowers a list argument the way the host does, through `cabi_realloc`.
    fn lower(bytes: &[u8]) -> (*mut u8, usize) {
        unsafe {
            let ptr = wit_guest::alloc::realloc(ptr::null_mut(), 0, 1, bytes.len());
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
            (ptr, bytes.len())
        }
    }

    unsafe fn lift(ret: *mut usize) -> Vec<u8> {
        let (ptr, len) = (*ret as *const u8, *ret.add(1));
        if len == 0 {
            Vec::new()
        } else {
            slice::from_raw_parts(ptr, len).to_vec()
        }
    }

    // NOTE: Exports share a single return area, so they are exercised from one
    // test, in sequence.
    #[test]
    fn exports_hand_ownership_back() {
        for bytes in &[&[1u8, 2, 3, 4, 5][..], &[]] {
            let (ptr, len) = lower(bytes);
            unsafe {
                let ret = print_vec(ptr, len);
                assert_eq!(lift(ret), bytes.to_vec());
                post_print_vec(ret);
            }
        }

        let (ptr, len) = lower(b"component");
        unsafe {
            let ret = greet(ptr, len);
            assert_eq!(lift(ret), b"hello, component!".to_vec());
            post_greet(ret);
        }

        assert_eq!(add(40, 2), 42);
        assert_eq!(add(i32::MAX, 1), i32::MIN);
        assert_eq!(add(-5, 3), -2);
        assert_eq!(run(), 1);
    }
}
